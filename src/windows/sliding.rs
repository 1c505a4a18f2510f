//! Window generators: sub-documents by wordtok/byte budget or by
//! paragraph count.

use crate::doc::{SentIndex, Sentence, TextDoc, TextUnit};
use crate::error::{Result, TextError};
use crate::markdown::normalize_markdown;
use crate::tokens::{join_wordtoks, tokenize};

/// Generate sub-documents in a sliding window over the given document.
///
/// Each window seeks to the sentence at the current offset, extends
/// greedily to the size budget, then backs off one sentence at a time
/// until the window fits. Fails if a single sentence exceeds the window.
pub fn sliding_word_window(
    doc: &TextDoc,
    window_size: usize,
    window_shift: usize,
    unit: TextUnit,
) -> Result<Vec<TextDoc>> {
    if window_shift == 0 {
        return Err(TextError::InvalidInput(
            "window shift must be at least 1".into(),
        ));
    }
    let total_size = doc.size(unit);
    let mut windows = Vec::new();
    let mut start_offset = 0;
    let (mut start_index, _) = doc.seek_to_sent(start_offset, unit)?;

    while start_offset < total_size {
        let end_offset = start_offset + window_size;
        let (mut end_index, _) = doc.seek_to_sent(end_offset, unit)?;

        // The end sentence may extend past the budget; back off until the
        // window fits.
        let mut sub_doc = doc.sub_doc(start_index, Some(end_index))?;
        while sub_doc.size(unit) > window_size {
            end_index = doc.prev_sent(end_index).map_err(|_| {
                TextError::Content(format!(
                    "window size {window_size} too small for sentence at offset {start_offset}"
                ))
            })?;
            sub_doc = doc.sub_doc(start_index, Some(end_index))?;
        }

        windows.push(sub_doc);
        start_offset += window_shift;
        start_index = end_index;
    }

    Ok(windows)
}

/// Generate sub-documents taking `nparas` whole paragraphs at a time.
///
/// Each emitted slice is re-normalized as Markdown so list items emerge
/// as separate paragraphs; downstream sentence segmentation depends on
/// this.
pub fn sliding_para_window(doc: &TextDoc, nparas: usize) -> Result<Vec<TextDoc>> {
    if nparas == 0 {
        return Err(TextError::InvalidInput(
            "paragraph window size must be at least 1".into(),
        ));
    }
    let mut windows = Vec::new();
    let mut start = 0;
    while start < doc.paragraphs.len() {
        let end = (start + nparas - 1).min(doc.paragraphs.len() - 1);
        let sub_doc = doc.sub_paras(start, Some(end));
        let formatted = TextDoc::from_text(&normalize_markdown(&sub_doc.reassemble()));
        windows.push(formatted);
        start += nparas;
    }
    Ok(windows)
}

fn truncate_sent_at_wordtok_offset(sent: &Sentence, offset: usize) -> Sentence {
    let wordtoks = tokenize(&sent.text, false);
    let truncated = &wordtoks[..offset.min(wordtoks.len())];
    Sentence::new(join_wordtoks(truncated), sent.char_offset)
}

/// Return a prefix of the document with at most `offset` wordtoks; the
/// last sentence may be truncated mid-sentence.
pub fn truncate_at_wordtok_offset(doc: &TextDoc, offset: usize) -> Result<TextDoc> {
    let (index, _) = doc.seek_to_sent(offset, TextUnit::Wordtoks)?;
    let mut sub_doc = match doc.prev_sent(index) {
        Ok(prev) => doc.sub_doc(SentIndex::new(0, 0), Some(prev))?,
        // Offset is within the first sentence.
        Err(_) => TextDoc::default(),
    };
    let current_size = if sub_doc.paragraphs.is_empty() {
        0
    } else {
        // Account for the break token before the truncated sentence.
        sub_doc.size(TextUnit::Wordtoks) + 1
    };
    let last_sent = &doc.paragraphs[index.para_index].sentences[index.sent_index];
    let remaining = offset.saturating_sub(current_size);
    if remaining > 0 {
        sub_doc.append_sent(truncate_sent_at_wordtok_offset(last_sent, remaining));
    }
    Ok(sub_doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::size;

    const EXAMPLE_TEXT: &str = "\
This is the first paragraph. It has multiple sentences.

This is the second paragraph. It also has multiple sentences. And it continues.

Here is the third paragraph. More sentences follow. And here is another one.";

    #[test]
    fn byte_windows_cover_the_doc_in_overlapping_slices() {
        let doc = TextDoc::from_text(EXAMPLE_TEXT);
        let windows = sliding_word_window(&doc, 80, 60, TextUnit::Bytes).unwrap();

        let sentence_windows: Vec<Vec<Vec<&str>>> = windows
            .iter()
            .map(|win| {
                win.paragraphs
                    .iter()
                    .map(|p| p.sentences.iter().map(|s| s.text.as_str()).collect())
                    .collect()
            })
            .collect();

        assert_eq!(
            sentence_windows,
            vec![
                vec![vec![
                    "This is the first paragraph.",
                    "It has multiple sentences.",
                ]],
                vec![
                    vec!["It has multiple sentences."],
                    vec!["This is the second paragraph."],
                ],
                vec![vec![
                    "This is the second paragraph.",
                    "It also has multiple sentences.",
                    "And it continues.",
                ]],
                vec![
                    vec!["And it continues."],
                    vec!["Here is the third paragraph.", "More sentences follow."],
                ],
            ]
        );

        for window in &windows {
            let sub_text = window.reassemble();
            assert!(size(&sub_text, TextUnit::Bytes).unwrap() <= 80);
            assert!(doc.reassemble().contains(&sub_text));
        }
    }

    #[test]
    fn windows_fail_when_a_sentence_exceeds_the_budget() {
        let doc = TextDoc::from_text(EXAMPLE_TEXT);
        let err = sliding_word_window(&doc, 10, 10, TextUnit::Bytes).unwrap_err();
        assert!(err.is_content_error());
    }

    #[test]
    fn para_windows_take_fixed_paragraph_counts() {
        let text = (0..7)
            .map(|i| format!("Paragraph {i}."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let doc = TextDoc::from_text(&text);
        let windows = sliding_para_window(&doc, 3).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].paragraphs.len(), 3);
        assert_eq!(windows[2].paragraphs.len(), 1);
        assert_eq!(windows[2].reassemble(), "Paragraph 6.");
    }

    #[test]
    fn para_windows_keep_list_items_paragraph_separated() {
        let doc = TextDoc::from_text(
            "Intro paragraph.\n\n- item one\n\n- item two\n\n- item three",
        );
        let windows = sliding_para_window(&doc, 2).unwrap();
        assert_eq!(windows.len(), 2);
        // Normalization keeps each list item its own paragraph.
        assert_eq!(windows[1].paragraphs.len(), 2);
        let total_paras: usize = windows.iter().map(|w| w.paragraphs.len()).sum();
        assert_eq!(total_paras, 4);
    }

    #[test]
    fn truncation_cuts_within_a_sentence() {
        let sent = Sentence::new("This is a test sentence.", 999);
        assert_eq!(truncate_sent_at_wordtok_offset(&sent, 0).text, "");
        let truncated = truncate_sent_at_wordtok_offset(&sent, 7);
        assert_eq!(truncated.text, "This is a test");
        assert_eq!(truncated.char_offset, 999);
    }

    #[test]
    fn truncation_cuts_documents_at_wordtok_offsets() {
        let doc = TextDoc::from_text(EXAMPLE_TEXT);

        let truncated = truncate_at_wordtok_offset(&doc, 10).unwrap();
        assert_eq!(truncated.reassemble(), "This is the first paragraph.");

        let truncated = truncate_at_wordtok_offset(&doc, 34).unwrap();
        let expected = "This is the first paragraph. It has multiple sentences.\n\n\
                        This is the second paragraph. It also";
        assert_eq!(
            truncated.reassemble(),
            TextDoc::from_text(expected).reassemble()
        );
    }
}
