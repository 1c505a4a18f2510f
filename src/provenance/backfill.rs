//! Backfill timestamps from a source document into a derived document.
//!
//! The derived document (say, a cleaned transcript) no longer carries the
//! source's timestamp tags. A token mapping from the source's wordtoks to
//! the derived document's wordtoks lets each paragraph (or sentence) be
//! traced back to its position in the source, where the nearest preceding
//! timestamp is extracted and appended to the derived text as a citation.

use crate::diff::mapping::TokenMapping;
use crate::doc::{TextDoc, TextUnit};
use crate::error::{Result, TextError};
use crate::provenance::TimestampExtractor;
use crate::provenance::citations::{add_citation_to_text, format_timestamp_citation};
use crate::tokens::{Wordtok, search_tokens};

/// Where citations are inserted in the derived document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationUnit {
    /// One citation per sentence.
    Sentences,
    /// One citation per paragraph.
    Paragraphs,
}

impl CitationUnit {
    fn is_citation_position(self, wordtok: &Wordtok) -> bool {
        match self {
            CitationUnit::Sentences => matches!(
                wordtok,
                Wordtok::SentBreak | Wordtok::ParaBreak | Wordtok::Eof
            ),
            CitationUnit::Paragraphs => matches!(wordtok, Wordtok::ParaBreak | Wordtok::Eof),
        }
    }
}

impl TryFrom<TextUnit> for CitationUnit {
    type Error = TextError;

    fn try_from(unit: TextUnit) -> Result<CitationUnit> {
        match unit {
            TextUnit::Sentences => Ok(CitationUnit::Sentences),
            TextUnit::Paragraphs => Ok(CitationUnit::Paragraphs),
            other => Err(TextError::InvalidInput(format!(
                "only sentences and paragraphs are supported for citations: {other}"
            ))),
        }
    }
}

/// Outcome of a backfill pass.
#[derive(Debug)]
pub struct BackfillOutcome {
    /// The derived text with citations appended.
    pub text: String,
    /// Timestamps found, in document order.
    pub timestamps_found: Vec<f64>,
}

/// Pull timestamps from a timestamped source document and insert them as
/// citations into the derived text. The source must have similar tokens.
///
/// Missing timestamps are skippable content errors (the affected position
/// may be meta text such as a speaker label); they are logged and the
/// pass continues.
pub fn backfill_timestamps(
    derived_text: &str,
    source_text: &str,
    source_url: &str,
    unit: CitationUnit,
) -> Result<BackfillOutcome> {
    if derived_text.trim().is_empty() {
        return Err(TextError::InvalidInput("derived text must have a body".into()));
    }
    if source_text.trim().is_empty() {
        return Err(TextError::InvalidInput("source text must have a body".into()));
    }
    if source_url.trim().is_empty() {
        return Err(TextError::InvalidInput("source must have a URL".into()));
    }

    let mut derived_doc = TextDoc::from_text(derived_text);
    let derived_wordtoks = derived_doc.as_wordtoks(true);

    // Don't parse sentences on the source, which may be long and heavy
    // with HTML; tokens are enough.
    let extractor = TimestampExtractor::new(source_text);
    extractor.precondition_check()?;

    tracing::debug!(
        source_wordtoks = extractor.wordtoks().len(),
        derived = %derived_doc.size_summary(),
        "Mapping source tokens into the derived document"
    );

    let mapping = TokenMapping::new(extractor.wordtoks().to_vec(), derived_wordtoks.clone())?;

    let mut timestamps_found = Vec::new();
    for (wordtok_offset, (wordtok, sent_index)) in
        derived_doc.as_wordtok_to_sent(true).into_iter().enumerate()
    {
        if !unit.is_citation_position(&wordtok) {
            continue;
        }

        // For paragraph citations, anchor at the start of the paragraph
        // rather than at the break; the anchor cursor is separate from
        // the iteration offset.
        let anchor = match unit {
            CitationUnit::Paragraphs => {
                match search_tokens(&derived_wordtoks)
                    .at(wordtok_offset as isize)
                    .seek_back(|tok: &Wordtok| {
                        matches!(tok, Wordtok::Bof | Wordtok::ParaBreak)
                    })
                    .and_then(|cursor| cursor.next())
                    .map(|cursor| cursor.get_index())
                {
                    Ok(index) => index,
                    Err(err) => {
                        tracing::warn!(
                            wordtok_offset,
                            error = %err,
                            "Could not find paragraph start; skipping citation"
                        );
                        continue;
                    }
                }
            }
            CitationUnit::Sentences => wordtok_offset,
        };

        let source_offset = mapping.map_back(anchor);

        match extractor.extract_preceding(source_offset) {
            Ok(found) => {
                timestamps_found.push(found.seconds);
                let citation = format_timestamp_citation(source_url, found.seconds);
                derived_doc
                    .update_sent(sent_index, |old| add_citation_to_text(old, &citation))?;
            }
            Err(err) if err.is_content_error() => {
                // Not fatal: the position may be meta text with no stamp.
                tracing::warn!(
                    wordtok_offset,
                    %sent_index,
                    error = %err,
                    "Failed to extract timestamp; skipping citation"
                );
            }
            Err(err) => return Err(err),
        }
    }

    let (first, last) = match (timestamps_found.first(), timestamps_found.last()) {
        (Some(first), Some(last)) => (format!("{first}"), format!("{last}")),
        _ => ("none".to_string(), "none".to_string()),
    };
    tracing::info!(
        count = timestamps_found.len(),
        first,
        last,
        "Backfilled timestamps from source document"
    );

    Ok(BackfillOutcome {
        text: derived_doc.reassemble(),
        timestamps_found,
    })
}
