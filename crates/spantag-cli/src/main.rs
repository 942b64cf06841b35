//! Spantag CLI
//!
//! Converts span-annotated JSON lines splits into BMES-tagged examples and
//! writes the label vocabulary.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use spantag_core::{
    DataProcessor, JsonLinesReader, NerProcessor, OverlapPolicy, ProcessorConfig, Split,
    SpantagError, TextNormalizer, Utf8Normalizer, WhitespaceNormalizer, decode, labels,
};
use tracing::{Level, info, warn};

/// CLI arguments
#[derive(Parser)]
#[command(name = "spantag")]
#[command(about = "Convert span-annotated NER records into BMES sequence tags")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding train.json, dev.json and test.json
    #[arg(short = 'd', long, env = "SPANTAG_DATA_DIR", default_value = ".", global = true)]
    data_dir: PathBuf,

    /// More log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the tagged examples of one split as JSON lines
    Convert {
        /// Which split to convert
        #[arg(short, long, value_enum, default_value_t = SplitArg::Train)]
        split: SplitArg,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How overlapping spans are handled
        #[arg(long, value_enum, default_value_t = OverlapArg::Overwrite)]
        overlap: OverlapArg,

        /// Reject entity types outside the label vocabulary
        #[arg(long)]
        strict_labels: bool,

        /// Replace whitespace and control characters with spaces
        #[arg(long)]
        normalize_whitespace: bool,
    },
    /// Write the label vocabulary, one label per line
    Labels {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load every split and report tagging statistics
    Check,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SplitArg {
    Train,
    Dev,
    Test,
}

impl From<SplitArg> for Split {
    fn from(arg: SplitArg) -> Self {
        match arg {
            SplitArg::Train => Split::Train,
            SplitArg::Dev => Split::Dev,
            SplitArg::Test => Split::Test,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OverlapArg {
    /// Later spans overwrite earlier ones
    Overwrite,
    /// Fail on the first overlapping span
    Reject,
}

impl From<OverlapArg> for OverlapPolicy {
    fn from(arg: OverlapArg) -> Self {
        match arg {
            OverlapArg::Overwrite => OverlapPolicy::Overwrite,
            OverlapArg::Reject => OverlapPolicy::Reject,
        }
    }
}

/// Per-split figures reported by `check`.
#[derive(Debug, Default)]
struct SplitStats {
    examples: usize,
    chars: usize,
    tagged_chars: usize,
    spans: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            split,
            output,
            overlap,
            strict_labels,
            normalize_whitespace,
        } => {
            let config = ProcessorConfig::new()
                .with_overlap_policy(overlap.into())
                .with_strict_labels(strict_labels);
            let normalizer: Box<dyn TextNormalizer> = if normalize_whitespace {
                Box::new(WhitespaceNormalizer)
            } else {
                Box::new(Utf8Normalizer)
            };
            let processor = NerProcessor::with_parts(JsonLinesReader, normalizer, config);
            let split = split.into();
            let mut out = open_output(output.as_deref())?;
            let count = convert(&processor, &cli.data_dir, split, &mut out)?;
            info!(split = %split, examples = count, "conversion finished");
            Ok(())
        }
        Commands::Labels { output } => write_labels(output.as_deref()),
        Commands::Check => {
            check(&NerProcessor::new(), &cli.data_dir, &mut io::stdout().lock())?;
            Ok(())
        }
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

/// Write the examples of `split` as JSON lines, returning how many were written.
fn convert(
    processor: &impl DataProcessor,
    data_dir: &Path,
    split: Split,
    out: &mut impl Write,
) -> Result<usize> {
    let examples = processor
        .get_examples(data_dir, split)
        .with_context(|| format!("loading {split} split from {}", data_dir.display()))?;

    for example in &examples {
        serde_json::to_writer(&mut *out, example)?;
        writeln!(out)?;
    }
    out.flush()?;

    Ok(examples.len())
}

fn write_labels(output: Option<&Path>) -> Result<()> {
    let mut out = open_output(output)?;
    for label in labels() {
        writeln!(out, "{label}")?;
    }
    out.flush()?;
    Ok(())
}

/// Report statistics for every split present in `data_dir`; missing splits
/// are skipped.
fn check(
    processor: &impl DataProcessor,
    data_dir: &Path,
    out: &mut impl Write,
) -> Result<Vec<(Split, SplitStats)>> {
    let mut report = Vec::new();

    for &split in Split::all() {
        let examples = match processor.get_examples(data_dir, split) {
            Ok(examples) => examples,
            Err(SpantagError::SourceNotFound { path }) => {
                warn!(split = %split, path = %path.display(), "split missing, skipped");
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("checking {split} split"));
            }
        };

        let mut stats = SplitStats::default();
        for example in &examples {
            stats.examples += 1;
            stats.chars += example.len();
            stats.tagged_chars += example.tags.iter().filter(|t| *t != "O").count();
            stats.spans += decode(&example.tags).len();
        }

        writeln!(
            out,
            "{split}: {} examples, {} chars, {} tagged chars, {} spans",
            stats.examples, stats.chars, stats.tagged_chars, stats.spans
        )?;
        report.push((split, stats));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spantag_core::Example;
    use std::fs;

    fn write_split(dir: &Path, split: Split, contents: &str) {
        fs::write(split.path_in(dir), contents).unwrap();
    }

    #[test]
    fn test_arg_conversions() {
        assert_eq!(OverlapPolicy::from(OverlapArg::Reject), OverlapPolicy::Reject);
        assert_eq!(OverlapPolicy::from(OverlapArg::Overwrite), OverlapPolicy::Overwrite);
        assert_eq!(Split::from(SplitArg::Train), Split::Train);
        assert_eq!(Split::from(SplitArg::Dev), Split::Dev);
        assert_eq!(Split::from(SplitArg::Test), Split::Test);
    }

    #[test]
    fn test_convert_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        write_split(
            dir.path(),
            Split::Train,
            "{\"text\": \"浙商银行\", \"label\": {\"company\": {\"浙商银行\": [[0, 3]]}}}\n{\"id\": \"x\", \"text\": \"叶老\"}\n",
        );

        let mut out = Vec::<u8>::new();
        let count = convert(&NerProcessor::new(), dir.path(), Split::Train, &mut out).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(out).unwrap();
        let examples: Vec<Example> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(
            examples,
            [
                Example::new(
                    "0",
                    "浙商银行",
                    vec![
                        "B-company".into(),
                        "M-company".into(),
                        "M-company".into(),
                        "E-company".into()
                    ]
                ),
                Example::new("x", "叶老", vec!["O".into(), "O".into()]),
            ]
        );
    }

    #[test]
    fn test_convert_missing_split_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::<u8>::new();
        let err = convert(&NerProcessor::new(), dir.path(), Split::Test, &mut out).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SpantagError>(),
            Some(SpantagError::SourceNotFound { .. })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_check_skips_missing_split() {
        let dir = tempfile::tempdir().unwrap();
        write_split(
            dir.path(),
            Split::Train,
            "{\"text\": \"abcd\", \"label\": {\"name\": {\"ab\": [[0, 1]]}, \"game\": {\"d\": [[3, 3]]}}}\n",
        );
        write_split(dir.path(), Split::Test, "{\"text\": \"xyz\"}\n{\"text\": \"q\"}\n");

        let mut out = Vec::<u8>::new();
        let report = check(&NerProcessor::new(), dir.path(), &mut out).unwrap();

        let splits: Vec<Split> = report.iter().map(|(split, _)| *split).collect();
        assert_eq!(splits, [Split::Train, Split::Test]);

        let train = &report[0].1;
        assert_eq!(train.examples, 1);
        assert_eq!(train.chars, 4);
        assert_eq!(train.tagged_chars, 3);
        assert_eq!(train.spans, 2);

        let test = &report[1].1;
        assert_eq!(test.examples, 2);
        assert_eq!(test.chars, 4);
        assert_eq!(test.tagged_chars, 0);
        assert_eq!(test.spans, 0);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("train: 1 examples, 4 chars, 3 tagged chars, 2 spans"));
        assert!(!text.contains("dev:"));
    }

    #[test]
    fn test_check_aborts_on_bad_record() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), Split::Dev, "{\"id\": \"no text\"}\n");

        let err = check(&NerProcessor::new(), dir.path(), &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SpantagError>(),
            Some(SpantagError::MalformedRecord { line: 1, .. })
        ));
    }
}
