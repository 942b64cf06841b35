use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading and tagging annotated records.
#[derive(Debug, Error)]
pub enum SpantagError {
    /// The split file does not exist.
    #[error("split source not found: {}", path.display())]
    SourceNotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// A line could not be decoded into a record.
    #[error("malformed record at {}:{line}: {reason}", path.display())]
    MalformedRecord {
        /// File the record was read from.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Decoder message.
        reason: String,
    },

    /// A span does not fit inside the text it annotates.
    #[error("invalid span [{start}, {end}] for {entity_type:?} in text of length {len}")]
    InvalidSpan {
        entity_type: String,
        start: usize,
        end: usize,
        len: usize,
    },

    /// A span touches a position that an earlier span already tagged.
    #[error("span [{start}, {end}] for {entity_type:?} overlaps an earlier span")]
    OverlappingSpans {
        entity_type: String,
        start: usize,
        end: usize,
    },

    /// The entity type is not part of the label vocabulary.
    #[error("unknown entity type: {0:?}")]
    UnknownEntityType(String),

    /// The string is not a tag of the label vocabulary.
    #[error("unknown tag: {0:?}")]
    UnknownTag(String),

    /// Any other I/O failure while reading a split.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for spantag operations.
pub type Result<T> = std::result::Result<T, SpantagError>;
