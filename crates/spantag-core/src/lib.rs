//! # Spantag Core
//!
//! Converts span-annotated NER records into per-character BMES tags for
//! sequence labeling. Provides the label vocabulary, the span encoder, and
//! data processors that load train/dev/test splits into tagged examples.
//!
//! ## Quick Start
//!
//! ```rust
//! use spantag_core::{encode, Annotations};
//!
//! let label: Annotations = serde_json::from_str(r#"{"company": {"浙商银行": [[0, 3]]}}"#).unwrap();
//! let tags = encode("浙商银行", Some(&label)).unwrap();
//!
//! assert_eq!(tags, ["B-company", "M-company", "M-company", "E-company"]);
//! ```
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod labels;
pub mod normalize;
pub mod processor;
pub mod reader;
pub mod record;

// Re-export primary API
pub use decoder::{TaggedSpan, decode};
pub use encoder::{Encoder, OverlapPolicy, encode};
pub use error::{Result, SpantagError};
pub use labels::{EntityType, LabelVocabulary, Tag, TagPrefix, labels};
pub use normalize::{TextNormalizer, Utf8Normalizer, WhitespaceNormalizer};
pub use processor::{DataProcessor, NerProcessor, ProcessorConfig};
pub use reader::{JsonLinesReader, RecordReader, Split, read_tsv};
pub use record::{Annotations, Example, Mentions, OrderedMap, RawRecord, Span};
