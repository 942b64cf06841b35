//! # Text Normalization
//!
//! Canonicalizes record text before encoding. Span offsets are defined
//! against the normalized text, so normalizers must map characters
//! one-for-one.

/// Maps raw record text to the form the spans index into.
pub trait TextNormalizer {
    /// Normalize `text` without changing its character count.
    fn normalize(&self, text: &str) -> String;
}

/// Unicode passthrough.
///
/// Record text is decoded and validated as UTF-8 by the reader, so there is
/// nothing left to convert.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Normalizer;

impl TextNormalizer for Utf8Normalizer {
    fn normalize(&self, text: &str) -> String {
        text.to_owned()
    }
}

/// Replaces whitespace and control characters with a single ASCII space
/// each, so tabs, newlines and ideographic spaces all look alike to the
/// model.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceNormalizer;

impl TextNormalizer for WhitespaceNormalizer {
    fn normalize(&self, text: &str) -> String {
        text.chars()
            .map(|c| {
                if c.is_whitespace() || c.is_control() {
                    ' '
                } else {
                    c
                }
            })
            .collect()
    }
}

impl<T: TextNormalizer + ?Sized> TextNormalizer for Box<T> {
    fn normalize(&self, text: &str) -> String {
        (**self).normalize(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        let text = "浙商银行 Bank\t01";
        assert_eq!(Utf8Normalizer.normalize(text), text);
    }

    #[test]
    fn test_whitespace_keeps_char_count() {
        let text = "叶老桂\t博士\u{3000}说\n\u{0007}";
        let normalized = WhitespaceNormalizer.normalize(text);
        assert_eq!(normalized, "叶老桂 博士 说  ");
        assert_eq!(normalized.chars().count(), text.chars().count());
    }

    #[test]
    fn test_boxed_normalizer() {
        let normalizer: Box<dyn TextNormalizer> = Box::new(WhitespaceNormalizer);
        assert_eq!(normalizer.normalize("a\tb"), "a b");
    }
}
