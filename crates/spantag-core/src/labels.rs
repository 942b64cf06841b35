//! # BMES Label Vocabulary
//!
//! Defines the closed tag set emitted by the span encoder. Every entity
//! type is combined with the four BMES position prefixes (Begin, Middle,
//! End, Single), and `O` marks characters outside any entity.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::SpantagError;

/// Tag for characters outside every entity.
pub const OUTSIDE: &str = "O";

/// Entity categories of the CLUENER dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    Address,
    Book,
    Company,
    Game,
    Government,
    Movie,
    Name,
    Organization,
    Position,
    Scene,
}

impl EntityType {
    /// Total number of entity types.
    pub const COUNT: usize = 10;

    /// All entity types in vocabulary order.
    pub fn all() -> &'static [EntityType] {
        &[
            EntityType::Address,
            EntityType::Book,
            EntityType::Company,
            EntityType::Game,
            EntityType::Government,
            EntityType::Movie,
            EntityType::Name,
            EntityType::Organization,
            EntityType::Position,
            EntityType::Scene,
        ]
    }

    /// Position of this type in [`EntityType::all`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Get an entity type from its index.
    pub fn from_index(idx: usize) -> Option<Self> {
        Self::all().get(idx).copied()
    }

    /// The label name as it appears in annotation files.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Address => "address",
            EntityType::Book => "book",
            EntityType::Company => "company",
            EntityType::Game => "game",
            EntityType::Government => "government",
            EntityType::Movie => "movie",
            EntityType::Name => "name",
            EntityType::Organization => "organization",
            EntityType::Position => "position",
            EntityType::Scene => "scene",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = SpantagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| SpantagError::UnknownEntityType(s.to_string()))
    }
}

/// Position of a character inside an entity mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagPrefix {
    Begin,
    Middle,
    End,
    Single,
}

impl TagPrefix {
    /// All prefixes in vocabulary order.
    pub fn all() -> &'static [TagPrefix] {
        &[
            TagPrefix::Begin,
            TagPrefix::Middle,
            TagPrefix::End,
            TagPrefix::Single,
        ]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TagPrefix::Begin => "B",
            TagPrefix::Middle => "M",
            TagPrefix::End => "E",
            TagPrefix::Single => "S",
        }
    }

    /// Build the tag string for this prefix and an arbitrary entity label.
    pub fn tag(&self, entity_type: &str) -> String {
        format!("{}-{}", self.as_str(), entity_type)
    }
}

impl fmt::Display for TagPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagPrefix {
    type Err = SpantagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "B" => Ok(TagPrefix::Begin),
            "M" => Ok(TagPrefix::Middle),
            "E" => Ok(TagPrefix::End),
            "S" => Ok(TagPrefix::Single),
            _ => Err(SpantagError::UnknownTag(s.to_string())),
        }
    }
}

/// A typed member of the default vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Outside,
    Entity(TagPrefix, EntityType),
}

impl Tag {
    /// Total number of distinct tags.
    pub const NUM_TAGS: usize = 1 + 4 * EntityType::COUNT;

    /// Get the tag index for tensor operations.
    ///
    /// Matches the position of the tag string in [`labels`].
    pub fn index(&self) -> usize {
        match self {
            Tag::Outside => 0,
            Tag::Entity(prefix, ty) => 1 + prefix.index() * EntityType::COUNT + ty.index(),
        }
    }

    /// Get tag from index.
    pub fn from_index(idx: usize) -> Option<Self> {
        if idx == 0 {
            return Some(Tag::Outside);
        }
        let offset = idx - 1;
        let prefix = TagPrefix::all().get(offset / EntityType::COUNT)?;
        let ty = EntityType::from_index(offset % EntityType::COUNT)?;
        Some(Tag::Entity(*prefix, ty))
    }

    pub fn prefix(&self) -> Option<TagPrefix> {
        match self {
            Tag::Outside => None,
            Tag::Entity(prefix, _) => Some(*prefix),
        }
    }

    pub fn entity_type(&self) -> Option<EntityType> {
        match self {
            Tag::Outside => None,
            Tag::Entity(_, ty) => Some(*ty),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Outside => f.write_str(OUTSIDE),
            Tag::Entity(prefix, ty) => write!(f, "{prefix}-{ty}"),
        }
    }
}

impl FromStr for Tag {
    type Err = SpantagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == OUTSIDE {
            return Ok(Tag::Outside);
        }
        let unknown = || SpantagError::UnknownTag(s.to_string());
        let (prefix, ty) = s.split_once('-').ok_or_else(unknown)?;
        let prefix = prefix.parse::<TagPrefix>().map_err(|_| unknown())?;
        let ty = ty.parse::<EntityType>().map_err(|_| unknown())?;
        Ok(Tag::Entity(prefix, ty))
    }
}

static CLUE_VOCABULARY: LazyLock<LabelVocabulary> =
    LazyLock::new(|| LabelVocabulary::new(EntityType::all().iter().map(EntityType::as_str)));

/// Ordered set of tag strings: `O`, then every prefix (outer) crossed with
/// every entity type (inner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    entity_types: Vec<String>,
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelVocabulary {
    /// Build a vocabulary over the given entity types, in the given order.
    pub fn new<I, S>(entity_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entity_types: Vec<String> = entity_types.into_iter().map(Into::into).collect();

        let mut labels = Vec::with_capacity(1 + TagPrefix::all().len() * entity_types.len());
        labels.push(OUTSIDE.to_string());
        for prefix in TagPrefix::all() {
            for ty in &entity_types {
                labels.push(prefix.tag(ty));
            }
        }

        let index = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), i))
            .collect();

        Self {
            entity_types,
            labels,
            index,
        }
    }

    /// The process-wide CLUENER vocabulary (41 labels).
    pub fn clue() -> &'static LabelVocabulary {
        &CLUE_VOCABULARY
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn entity_types(&self) -> &[String] {
        &self.entity_types
    }

    pub fn has_entity_type(&self, entity_type: &str) -> bool {
        self.entity_types.iter().any(|ty| ty == entity_type)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

/// The CLUENER label list, `O` first.
pub fn labels() -> &'static [String] {
    LabelVocabulary::clue().labels()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_size_and_order() {
        let labels = labels();
        assert_eq!(labels.len(), 41);
        assert_eq!(labels[0], "O");
        assert_eq!(labels[1], "B-address");
        assert_eq!(labels[10], "B-scene");
        assert_eq!(labels[11], "M-address");
        assert_eq!(labels[21], "E-address");
        assert_eq!(labels[31], "S-address");
        assert_eq!(labels[40], "S-scene");

        for (block, prefix) in ["B", "M", "E", "S"].iter().enumerate() {
            let start = 1 + block * 10;
            for label in &labels[start..start + 10] {
                assert!(label.starts_with(&format!("{prefix}-")), "{label}");
            }
        }
    }

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(labels(), labels());
        assert!(std::ptr::eq(LabelVocabulary::clue(), LabelVocabulary::clue()));
    }

    #[test]
    fn test_tag_index_roundtrip() {
        for idx in 0..Tag::NUM_TAGS {
            let tag = Tag::from_index(idx).unwrap();
            assert_eq!(tag.index(), idx);
            assert_eq!(tag.to_string(), labels()[idx]);
            assert_eq!(tag.to_string().parse::<Tag>().unwrap(), tag);
        }
        assert_eq!(Tag::from_index(Tag::NUM_TAGS), None);

        let tag: Tag = "E-organization".parse().unwrap();
        assert_eq!(tag.prefix(), Some(TagPrefix::End));
        assert_eq!(tag.entity_type(), Some(EntityType::Organization));
        assert_eq!(Tag::Outside.entity_type(), None);
    }

    #[test]
    fn test_vocabulary_lookup() {
        let vocab = LabelVocabulary::clue();
        assert_eq!(vocab.index_of("O"), Some(0));
        assert_eq!(vocab.index_of("M-name"), Some(17));
        assert_eq!(vocab.label(17), Some("M-name"));
        assert_eq!(vocab.index_of("I-name"), None);
        assert!(vocab.has_entity_type("government"));
        assert!(!vocab.has_entity_type("person"));
    }

    #[test]
    fn test_custom_vocabulary() {
        let vocab = LabelVocabulary::new(["PER", "LOC"]);
        let labels: Vec<&str> = vocab.iter().collect();
        assert_eq!(
            labels,
            ["O", "B-PER", "B-LOC", "M-PER", "M-LOC", "E-PER", "E-LOC", "S-PER", "S-LOC"]
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(matches!(
            "person".parse::<EntityType>(),
            Err(SpantagError::UnknownEntityType(_))
        ));
        assert!(matches!("I-name".parse::<Tag>(), Err(SpantagError::UnknownTag(_))));
        assert!(matches!("B-person".parse::<Tag>(), Err(SpantagError::UnknownTag(_))));
        assert!(matches!("name".parse::<Tag>(), Err(SpantagError::UnknownTag(_))));
    }
}
