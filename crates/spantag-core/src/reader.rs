//! Data loading for span-annotated JSON lines files.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SpantagError};
use crate::record::RawRecord;

/// A dataset partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Dev,
    Test,
}

impl Split {
    pub fn all() -> &'static [Split] {
        &[Split::Train, Split::Dev, Split::Test]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Dev => "dev",
            Split::Test => "test",
        }
    }

    /// File holding this split inside a data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Split::Train => "train.json",
            Split::Dev => "dev.json",
            Split::Test => "test.json",
        }
    }

    pub fn path_in(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of raw records for a split.
pub trait RecordReader {
    fn read_split(&self, data_dir: &Path, split: Split) -> Result<Vec<RawRecord>>;
}

/// Reads one JSON object per line. Blank and `null` lines are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesReader;

impl JsonLinesReader {
    pub fn new() -> Self {
        Self
    }

    /// Read every record in `path`.
    pub fn read_file(&self, path: &Path) -> Result<Vec<RawRecord>> {
        let file = open(path)?;
        self.read_from(BufReader::new(file), path)
    }

    /// Read records from any buffered source; `origin` names it in errors.
    pub fn read_from<R: BufRead>(&self, reader: R, origin: &Path) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();

        for (idx, line) in reader.split(b'\n').enumerate() {
            let line_no = idx + 1;
            let bytes = line?;
            let malformed = |reason: String| SpantagError::MalformedRecord {
                path: origin.to_path_buf(),
                line: line_no,
                reason,
            };

            let line = std::str::from_utf8(&bytes).map_err(|e| malformed(e.to_string()))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<Option<RawRecord>>(line) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => debug!(path = %origin.display(), line = line_no, "skipping null line"),
                Err(e) => return Err(malformed(e.to_string())),
            }
        }

        Ok(records)
    }
}

impl RecordReader for JsonLinesReader {
    fn read_split(&self, data_dir: &Path, split: Split) -> Result<Vec<RawRecord>> {
        self.read_file(&split.path_in(data_dir))
    }
}

/// Read a tab separated file into rows of fields.
///
/// Standalone helper for TSV-based datasets; the JSON lines reader does not
/// use it. An empty line yields an empty row.
pub fn read_tsv(path: &Path) -> Result<Vec<Vec<String>>> {
    let reader = BufReader::new(open(path)?);
    let mut rows = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.is_empty() {
            rows.push(Vec::new());
            continue;
        }
        rows.push(line.split('\t').map(str::to_string).collect());
    }

    Ok(rows)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SpantagError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => SpantagError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(input: &str) -> Result<Vec<RawRecord>> {
        JsonLinesReader::new().read_from(Cursor::new(input), Path::new("mem.json"))
    }

    #[test]
    fn test_skips_blank_and_null_lines() {
        let input = "{\"text\": \"a\"}\n\n   \nnull\r\n{\"id\": \"x\", \"text\": \"b\"}";
        let records = read(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "a");
        assert_eq!(records[1].id.as_deref(), Some("x"));
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let input = "{\"text\": \"a\"}\n{\"id\": \"1\"}\n";
        match read(input) {
            Err(SpantagError::MalformedRecord { path, line, reason }) => {
                assert_eq!(path, Path::new("mem.json"));
                assert_eq!(line, 2);
                assert!(reason.contains("text"), "{reason}");
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json_and_utf8() {
        assert!(matches!(
            read("{not json}\n"),
            Err(SpantagError::MalformedRecord { line: 1, .. })
        ));

        let bytes: &[u8] = b"{\"text\": \"a\"}\n\xff\xfe\n";
        assert!(matches!(
            JsonLinesReader::new().read_from(bytes, Path::new("bin.json")),
            Err(SpantagError::MalformedRecord { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        match JsonLinesReader::new().read_split(dir.path(), Split::Dev) {
            Err(SpantagError::SourceNotFound { path }) => {
                assert_eq!(path, dir.path().join("dev.json"));
            }
            other => panic!("expected SourceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_read_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.tsv");
        std::fs::write(&path, "text\tlabel\r\n浙商银行\tcompany\n\n").unwrap();

        let rows = read_tsv(&path).unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["text".to_string(), "label".to_string()],
                vec!["浙商银行".to_string(), "company".to_string()],
                vec![],
            ]
        );

        assert!(matches!(
            read_tsv(&dir.path().join("absent.tsv")),
            Err(SpantagError::SourceNotFound { .. })
        ));
    }

    #[test]
    fn test_split_paths() {
        let dir = Path::new("data/cluener");
        assert_eq!(Split::Train.path_in(dir), dir.join("train.json"));
        assert_eq!(Split::Test.to_string(), "test");
        assert_eq!(Split::all().len(), 3);
    }
}
