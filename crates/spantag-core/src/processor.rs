//! # Data Processors
//!
//! Turn a split of annotated records into tagged [`Example`]s.
//!
//! A [`DataProcessor`] exposes one dataset: its train/dev/test splits and
//! its label list. [`NerProcessor`] is the span-annotated NER variant; it
//! reads records, normalizes their text and runs the span encoder.

use std::path::Path;

use tracing::{debug, info, trace};

use crate::encoder::{Encoder, OverlapPolicy};
use crate::error::Result;
use crate::labels::{LabelVocabulary, OUTSIDE};
use crate::normalize::{TextNormalizer, Utf8Normalizer};
use crate::reader::{JsonLinesReader, RecordReader, Split};
use crate::record::{Example, RawRecord};

/// Configuration for a [`NerProcessor`].
#[derive(Debug, Clone, Default)]
pub struct ProcessorConfig {
    /// How overlapping spans are handled.
    pub overlap_policy: OverlapPolicy,
    /// Reject entity types outside the label vocabulary.
    pub strict_labels: bool,
}

impl ProcessorConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    pub fn with_strict_labels(mut self, strict: bool) -> Self {
        self.strict_labels = strict;
        self
    }
}

/// A dataset that can be loaded split by split.
pub trait DataProcessor {
    /// Gets the examples of `split` from `data_dir`.
    fn get_examples(&self, data_dir: &Path, split: Split) -> Result<Vec<Example>>;

    /// Gets the labels this dataset's examples are tagged with.
    fn get_labels(&self) -> Vec<String>;

    fn get_train_examples(&self, data_dir: &Path) -> Result<Vec<Example>> {
        self.get_examples(data_dir, Split::Train)
    }

    fn get_dev_examples(&self, data_dir: &Path) -> Result<Vec<Example>> {
        self.get_examples(data_dir, Split::Dev)
    }

    fn get_test_examples(&self, data_dir: &Path) -> Result<Vec<Example>> {
        self.get_examples(data_dir, Split::Test)
    }
}

/// Processor for CLUENER-style span annotations.
#[derive(Debug, Clone)]
pub struct NerProcessor<R = JsonLinesReader, N = Utf8Normalizer> {
    reader: R,
    normalizer: N,
    encoder: Encoder,
    vocabulary: &'static LabelVocabulary,
}

impl NerProcessor {
    /// Create a processor reading JSON lines with default settings.
    pub fn new() -> Self {
        Self::with_config(ProcessorConfig::default())
    }

    pub fn with_config(config: ProcessorConfig) -> Self {
        Self::with_parts(JsonLinesReader, Utf8Normalizer, config)
    }
}

impl Default for NerProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RecordReader, N: TextNormalizer> NerProcessor<R, N> {
    /// Create a processor from a custom reader and normalizer.
    pub fn with_parts(reader: R, normalizer: N, config: ProcessorConfig) -> Self {
        let vocabulary = LabelVocabulary::clue();
        let mut encoder = Encoder::new().with_overlap_policy(config.overlap_policy);
        if config.strict_labels {
            encoder = encoder.with_vocabulary(vocabulary);
        }

        Self {
            reader,
            normalizer,
            encoder,
            vocabulary,
        }
    }

    pub fn vocabulary(&self) -> &'static LabelVocabulary {
        self.vocabulary
    }

    /// Convert records into examples, one per record, in input order.
    ///
    /// Stops at the first record that fails to encode.
    pub fn create_examples(&self, records: Vec<RawRecord>) -> Result<Vec<Example>> {
        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| self.create_example(i, record))
            .collect()
    }

    /// Convert the record at position `index` of its split.
    ///
    /// Records without an id are named after their position.
    pub fn create_example(&self, index: usize, record: RawRecord) -> Result<Example> {
        let id = record.id.unwrap_or_else(|| index.to_string());
        let text = self.normalizer.normalize(&record.text);

        let tags = match &record.label {
            Some(label) => self.encoder.encode(&text, Some(label)).inspect_err(|e| {
                debug!(record = index, id = %id, error = %e, "record failed to encode");
            })?,
            None => vec![OUTSIDE.to_string(); text.chars().count()],
        };

        trace!(record = index, id = %id, chars = tags.len(), "example created");
        Ok(Example { id, text, tags })
    }
}

impl<R: RecordReader, N: TextNormalizer> DataProcessor for NerProcessor<R, N> {
    fn get_examples(&self, data_dir: &Path, split: Split) -> Result<Vec<Example>> {
        let records = self.reader.read_split(data_dir, split)?;
        let examples = self.create_examples(records)?;
        info!(
            split = %split,
            path = %split.path_in(data_dir).display(),
            examples = examples.len(),
            "loaded examples"
        );
        Ok(examples)
    }

    fn get_labels(&self) -> Vec<String> {
        self.vocabulary.labels().to_vec()
    }
}
