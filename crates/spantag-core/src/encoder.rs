//! # Span Tag Encoder
//!
//! Turns character-offset entity spans into one BMES tag per character.
//!
//! Spans are applied in annotation order: entity types as they appear in
//! the record, surfaces within a type, then spans within a surface. When
//! spans overlap, the later one overwrites the tags of the earlier one
//! unless [`OverlapPolicy::Reject`] is selected.

use tracing::{Level, debug, trace};

use crate::error::{Result, SpantagError};
use crate::labels::{LabelVocabulary, OUTSIDE, TagPrefix};
use crate::record::{Annotations, Span};

/// What to do when a span covers a character another span already tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Later spans overwrite earlier ones.
    #[default]
    Overwrite,
    /// Fail with [`SpantagError::OverlappingSpans`].
    Reject,
}

/// Configurable span encoder.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    overlap_policy: OverlapPolicy,
    /// Entity types accepted in strict mode; `None` accepts any type.
    allowed_types: Option<Vec<String>>,
}

impl Encoder {
    /// Create an encoder with last-write-wins overlap handling and no
    /// entity type restriction.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    /// Only accept entity types present in `vocabulary`.
    pub fn with_vocabulary(mut self, vocabulary: &LabelVocabulary) -> Self {
        self.allowed_types = Some(vocabulary.entity_types().to_vec());
        self
    }

    pub fn overlap_policy(&self) -> OverlapPolicy {
        self.overlap_policy
    }

    pub fn is_strict(&self) -> bool {
        self.allowed_types.is_some()
    }

    /// Encode `annotations` over `text`.
    ///
    /// # Returns
    /// One tag per character of `text`. Characters outside every span are
    /// tagged `O`; with no annotations the whole text is `O`.
    ///
    /// # Errors
    /// - [`SpantagError::InvalidSpan`] if `start > end` or `end` is past the
    ///   last character.
    /// - [`SpantagError::OverlappingSpans`] under [`OverlapPolicy::Reject`].
    /// - [`SpantagError::UnknownEntityType`] in strict mode.
    ///
    /// # Examples
    /// ```
    /// use spantag_core::encoder::Encoder;
    /// use spantag_core::record::{Annotations, Mentions, Span};
    ///
    /// let mut mentions = Mentions::new();
    /// mentions.insert("abc", vec![Span::new(0, 2)]);
    /// let mut annotations = Annotations::new();
    /// annotations.insert("name", mentions);
    ///
    /// let tags = Encoder::new().encode("abcd", Some(&annotations)).unwrap();
    /// assert_eq!(tags, ["B-name", "M-name", "E-name", "O"]);
    /// ```
    pub fn encode(&self, text: &str, annotations: Option<&Annotations>) -> Result<Vec<String>> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut tags = vec![OUTSIDE.to_string(); len];

        let Some(annotations) = annotations else {
            return Ok(tags);
        };

        let track_overlaps = self.tracks_overlaps();
        let debug_enabled = tracing::enabled!(Level::DEBUG);
        let mut covered = if track_overlaps {
            vec![false; len]
        } else {
            Vec::new()
        };

        for (entity_type, mentions) in annotations.iter() {
            self.check_entity_type(entity_type)?;

            for (surface, spans) in mentions.iter() {
                for &span in spans {
                    validate(entity_type, span, len)?;
                    let Span { start, end } = span;

                    if track_overlaps && covered[start..=end].iter().any(|&c| c) {
                        match self.overlap_policy {
                            OverlapPolicy::Reject => {
                                return Err(SpantagError::OverlappingSpans {
                                    entity_type: entity_type.to_string(),
                                    start,
                                    end,
                                });
                            }
                            OverlapPolicy::Overwrite => {
                                debug!(entity_type, surface, start, end, "span overwrites earlier tags");
                            }
                        }
                    }

                    if debug_enabled && !surface.chars().eq(chars[start..=end].iter().copied()) {
                        debug!(entity_type, surface, start, end, "surface does not match text at span");
                    }

                    apply(&mut tags, entity_type, span);
                    if track_overlaps {
                        covered[start..=end].fill(true);
                    }
                    trace!(entity_type, surface, start, end, "span tagged");
                }
            }
        }

        Ok(tags)
    }

    /// Overlaps are only looked for when they are rejected or when debug
    /// logging would report them.
    fn tracks_overlaps(&self) -> bool {
        self.overlap_policy == OverlapPolicy::Reject || tracing::enabled!(Level::DEBUG)
    }

    fn check_entity_type(&self, entity_type: &str) -> Result<()> {
        match &self.allowed_types {
            Some(allowed) if !allowed.iter().any(|ty| ty == entity_type) => {
                Err(SpantagError::UnknownEntityType(entity_type.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Encode with the default encoder (last write wins, any entity type).
pub fn encode(text: &str, annotations: Option<&Annotations>) -> Result<Vec<String>> {
    Encoder::new().encode(text, annotations)
}

fn validate(entity_type: &str, span: Span, len: usize) -> Result<()> {
    if span.start > span.end || span.end >= len {
        return Err(SpantagError::InvalidSpan {
            entity_type: entity_type.to_string(),
            start: span.start,
            end: span.end,
            len,
        });
    }
    Ok(())
}

fn apply(tags: &mut [String], entity_type: &str, span: Span) {
    let Span { start, end } = span;
    if span.is_single() {
        tags[start] = TagPrefix::Single.tag(entity_type);
        return;
    }

    tags[start] = TagPrefix::Begin.tag(entity_type);
    let middle = TagPrefix::Middle.tag(entity_type);
    for tag in &mut tags[start + 1..end] {
        tag.clone_from(&middle);
    }
    tags[end] = TagPrefix::End.tag(entity_type);
}
