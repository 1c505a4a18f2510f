//! Provenance: locating timestamp annotations in source documents and
//! transplanting them into derived documents.

pub mod backfill;
pub mod citations;

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, TextError};
use crate::tokens::{Wordtok, search_tokens, tokenize_with_offsets};

// Any tag carrying a data-timestamp attribute.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:<\w+[^>]*\s)?data-timestamp=['"](\d+(\.\d+)?)['"][^>]*>"#)
        .expect("valid regex")
});

/// Parse the timestamp (in seconds) from a wordtok, if it is a tag
/// carrying a `data-timestamp` attribute.
pub fn extract_timestamp(wordtok: &Wordtok) -> Option<f64> {
    let Wordtok::Tag(text) = wordtok else {
        return None;
    };
    TIMESTAMP_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Does this wordtok carry a timestamp?
pub fn has_timestamp(wordtok: &Wordtok) -> bool {
    extract_timestamp(wordtok).is_some()
}

/// A located timestamp: seconds, wordtok index, and char offset in the
/// source document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestampMatch {
    /// Timestamp value in seconds.
    pub seconds: f64,
    /// Index of the carrying wordtok.
    pub wordtok_index: usize,
    /// Char offset of the carrying wordtok in the document text.
    pub char_offset: usize,
}

/// Extracts timestamps of the form `<span data-timestamp="123.45">` from
/// a document's token stream.
pub struct TimestampExtractor {
    wordtoks: Vec<Wordtok>,
    offsets: Vec<usize>,
}

impl TimestampExtractor {
    /// Tokenize a document (with BOF/EOF markers) for timestamp lookup.
    pub fn new(doc_str: &str) -> Self {
        let (wordtoks, offsets) = tokenize_with_offsets(doc_str, true);
        Self { wordtoks, offsets }
    }

    /// The tokenized document, bookended with BOF/EOF.
    pub fn wordtoks(&self) -> &[Wordtok] {
        &self.wordtoks
    }

    /// Fail unless the document carries at least one timestamp.
    pub fn precondition_check(&self) -> Result<()> {
        if self.wordtoks.iter().any(has_timestamp) {
            Ok(())
        } else {
            Err(TextError::InvalidInput(
                "document has no timestamps of the form `<span data-timestamp=\"123.45\">`".into(),
            ))
        }
    }

    /// All timestamps in the document, in order.
    pub fn extract_all(&self) -> impl Iterator<Item = TimestampMatch> + '_ {
        self.wordtoks
            .iter()
            .zip(&self.offsets)
            .enumerate()
            .filter_map(|(index, (wordtok, &offset))| {
                extract_timestamp(wordtok).map(|seconds| TimestampMatch {
                    seconds,
                    wordtok_index: index,
                    char_offset: offset,
                })
            })
    }

    /// The nearest timestamp strictly before the given wordtok offset.
    /// Fails with a content error when none precedes it.
    pub fn extract_preceding(&self, wordtok_offset: usize) -> Result<TimestampMatch> {
        let (index, wordtok) = search_tokens(&self.wordtoks)
            .at(wordtok_offset as isize)
            .seek_back(has_timestamp)
            .map_err(|_| {
                TextError::Content(format!(
                    "no timestamp found searching back from offset {wordtok_offset}"
                ))
            })?
            .get_token()?;
        let seconds = extract_timestamp(wordtok).ok_or_else(|| {
            TextError::Unexpected("matched token no longer carries a timestamp".into())
        })?;
        Ok(TimestampMatch {
            seconds,
            wordtok_index: index,
            char_offset: self.offsets[index],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "<span data-timestamp=\"1.234\">Sentence one.</span> \
<span data-timestamp=\"23\">Sentence two.</span> Sentence three.";

    #[test]
    fn extracts_timestamps_from_tags_only() {
        assert_eq!(
            extract_timestamp(&Wordtok::Tag("<span data-timestamp=\"5.60\">".into())),
            Some(5.6)
        );
        assert_eq!(
            extract_timestamp(&Wordtok::Tag(
                "<span class=\"x\" data-timestamp=\"10.29\"><a href=\"y\">".into()
            )),
            Some(10.29)
        );
        assert_eq!(extract_timestamp(&Wordtok::Tag("<span class=\"x\">".into())), None);
        assert_eq!(extract_timestamp(&Wordtok::Word("data-timestamp".into())), None);
    }

    #[test]
    fn extract_all_lists_timestamps_with_offsets() {
        let extractor = TimestampExtractor::new(DOC);
        extractor.precondition_check().unwrap();
        let matches: Vec<TimestampMatch> = extractor.extract_all().collect();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].seconds, 1.234);
        assert_eq!(matches[0].char_offset, 0);
        assert_eq!(matches[1].seconds, 23.0);
        assert_eq!(matches[1].char_offset, 50);
    }

    #[test]
    fn extract_preceding_walks_back_to_the_nearest_timestamp() {
        let extractor = TimestampExtractor::new(DOC);
        let wordtoks = extractor.wordtoks();

        let mut per_token = Vec::new();
        for i in 0..wordtoks.len() {
            per_token.push(extractor.extract_preceding(i).ok().map(|m| m.seconds));
        }

        // Nothing precedes BOF or the first tag itself.
        assert_eq!(per_token[0], None);
        assert_eq!(per_token[1], None);
        // Tokens inside the first span resolve to its timestamp.
        assert_eq!(per_token[2], Some(1.234));
        assert_eq!(per_token[6], Some(1.234));
        // The second span's content and the trailing sentence resolve to 23.
        assert_eq!(per_token[9], Some(23.0));
        assert_eq!(*per_token.last().unwrap(), Some(23.0));
    }

    #[test]
    fn precondition_fails_without_timestamps() {
        let extractor = TimestampExtractor::new("Plain text with <b>tags</b> but no stamps.");
        assert!(extractor.precondition_check().is_err());
    }
}
