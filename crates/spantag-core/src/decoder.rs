//! Recovers entity spans from a BMES tag sequence.

use crate::labels::OUTSIDE;

/// An entity span read back from tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSpan {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
}

/// Extract well-formed entity spans from `tags`.
///
/// `S-x` yields a one-character span; `B-x M-x* E-x` yields a span from the
/// `B` to the `E`. Runs that switch type or never reach `E` are dropped.
pub fn decode<S: AsRef<str>>(tags: &[S]) -> Vec<TaggedSpan> {
    let mut spans = Vec::new();
    let mut open: Option<(&str, usize)> = None;

    for (i, tag) in tags.iter().enumerate() {
        let tag = tag.as_ref();
        if tag == OUTSIDE {
            open = None;
            continue;
        }
        let Some((prefix, entity_type)) = tag.split_once('-') else {
            open = None;
            continue;
        };

        match prefix {
            "S" => {
                open = None;
                spans.push(TaggedSpan {
                    entity_type: entity_type.to_string(),
                    start: i,
                    end: i,
                });
            }
            "B" => open = Some((entity_type, i)),
            "M" => {
                if open.is_some_and(|(ty, _)| ty != entity_type) {
                    open = None;
                }
            }
            "E" => {
                if let Some((ty, start)) = open.take() {
                    if ty == entity_type {
                        spans.push(TaggedSpan {
                            entity_type: entity_type.to_string(),
                            start,
                            end: i,
                        });
                    }
                }
            }
            _ => open = None,
        }
    }

    spans
}
