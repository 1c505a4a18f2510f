//! The filtered transform driver: apply a transform window by window,
//! constrain its edits with a diff filter, and stitch the outputs back
//! together by minimum-edit-distance alignment.
//!
//! The window loop is sequential; each alignment depends on the
//! accumulated output so far. No partial output is observable: the driver
//! returns either the fully stitched document or an error, so a caller
//! cancelling (by returning an error from `transform` at a window
//! boundary) discards all partial state.

use crate::diff::{DiffFilter, diff_docs, find_best_alignment};
use crate::doc::{TextDoc, TextUnit};
use crate::error::{Result, TextError};
use crate::tokens::{join_wordtoks, tokenize};
use crate::windows::settings::{WINDOW_BR, WindowSettings};
use crate::windows::sliding::{sliding_para_window, sliding_word_window};

/// A caller-supplied transform over one document. The only place
/// expensive computation (such as an LLM call) enters the driver.
pub type TextDocTransform<'a> = dyn Fn(&TextDoc) -> Result<TextDoc> + 'a;

/// Remove `<!--window-br-->` markers from a document, so repeated passes
/// do not accumulate them.
pub fn remove_window_br(doc: &mut TextDoc) {
    doc.replace_str(WINDOW_BR, "");
}

/// Apply a transform across the document with an optional sliding window,
/// enforcing the changes it is allowed to make with `diff_filter`.
///
/// With no windowing, the transform is applied to the whole document at
/// once. With windowing, each window's diff is split by the filter;
/// accepted changes are applied and rejections logged and dropped.
pub fn filtered_transform(
    doc: &TextDoc,
    transform: &TextDocTransform<'_>,
    windowing: Option<&WindowSettings>,
    diff_filter: Option<&DiffFilter<'_>>,
) -> Result<TextDoc> {
    let Some(settings) = windowing else {
        return transform(doc);
    };

    let transform_and_check_diff = |window: &TextDoc| -> Result<TextDoc> {
        // Avoid window breaks building up after multiple transforms.
        let mut input_doc = window.clone();
        remove_window_br(&mut input_doc);

        let transformed_doc = transform(&input_doc)?;

        let Some(filter) = diff_filter else {
            return Ok(transformed_doc);
        };

        let diff = diff_docs(&input_doc, &transformed_doc);
        let input_wordtoks = input_doc.as_wordtoks(false);
        if diff.left_size() != input_wordtoks.len() {
            return Err(TextError::Unexpected(format!(
                "diff left size {} != window size {}",
                diff.left_size(),
                input_wordtoks.len()
            )));
        }

        let (accepted, rejected) = diff.filter(filter);
        tracing::debug!(accepted = %accepted.stats(), "Accepted transform changes");
        if !rejected.changes().is_empty() {
            tracing::info!(
                rejected = %rejected.stats(),
                "Filtering extraneous changes:\n{}",
                rejected.as_diff_str(false)
            );
        }

        let final_doc = TextDoc::from_wordtoks(&accepted.apply_to(&input_wordtoks)?);
        Ok(final_doc)
    };

    sliding_window_transform(doc, &transform_and_check_diff, settings)
}

/// Apply a transform in sliding windows, dispatching on the window unit.
pub fn sliding_window_transform(
    doc: &TextDoc,
    transform: &TextDocTransform<'_>,
    settings: &WindowSettings,
) -> Result<TextDoc> {
    match settings.unit {
        TextUnit::Wordtoks => sliding_wordtok_window_transform(doc, transform, settings),
        TextUnit::Paragraphs => sliding_para_window_transform(doc, transform, settings),
        other => Err(TextError::Unexpected(format!(
            "unsupported sliding transform unit: {other}"
        ))),
    }
}

/// Apply a transform to overlapping wordtok windows, stitching successive
/// outputs at the best alignment of each window's output with the
/// accumulated result.
pub fn sliding_wordtok_window_transform(
    doc: &TextDoc,
    transform: &TextDocTransform<'_>,
    settings: &WindowSettings,
) -> Result<TextDoc> {
    if settings.unit != TextUnit::Wordtoks {
        return Err(TextError::InvalidInput(format!(
            "this sliding window expects wordtoks, not {}",
            settings.unit
        )));
    }
    if settings.shift >= settings.size {
        return Err(TextError::InvalidInput(
            "wordtok windows must overlap: shift must be less than size".into(),
        ));
    }
    if settings.min_overlap > settings.shift {
        return Err(TextError::InvalidInput(
            "min_overlap cannot exceed the window shift".into(),
        ));
    }

    let windows = sliding_word_window(doc, settings.size, settings.shift, TextUnit::Wordtoks)?;

    let nwordtoks = doc.size(TextUnit::Wordtoks);
    let nwindows = nwordtoks.div_ceil(settings.shift);
    let sep_wordtoks = tokenize(&settings.separator, false);

    tracing::info!(
        nwordtoks,
        nbytes = doc.size(TextUnit::Bytes),
        nwindows,
        settings = %settings,
        "Sliding wordtok transform: begin"
    );

    let mut output_wordtoks = Vec::new();
    for (i, window) in windows.iter().enumerate() {
        tracing::debug!(
            window = i + 1,
            nwindows,
            window_wordtoks = window.size(TextUnit::Wordtoks),
            output_so_far = output_wordtoks.len(),
            "Sliding wordtok transform: window"
        );

        let transformed_window = transform(window)?;
        let new_wordtoks = transformed_window.as_wordtoks(false);

        if output_wordtoks.is_empty() {
            output_wordtoks = new_wordtoks;
            continue;
        }

        if output_wordtoks.len() < settings.min_overlap {
            return Err(TextError::Content(format!(
                "output wordtoks too short to align with min_overlap {}",
                settings.min_overlap
            )));
        }
        if new_wordtoks.len() < settings.min_overlap {
            tracing::warn!(
                window = i + 1,
                len = new_wordtoks.len(),
                min_overlap = settings.min_overlap,
                "New window output too short to align; skipping"
            );
            continue;
        }

        let alignment =
            find_best_alignment(&output_wordtoks, &new_wordtoks, settings.min_overlap, None)?;

        tracing::debug!(
            window = i + 1,
            offset = alignment.offset,
            score = alignment.score,
            stats = %alignment.diff.stats(),
            "Sliding wordtok transform: best alignment"
        );

        output_wordtoks.truncate(alignment.offset);
        output_wordtoks.extend(sep_wordtoks.iter().cloned());
        output_wordtoks.extend(new_wordtoks);
    }

    tracing::info!(
        output_wordtoks = output_wordtoks.len(),
        "Sliding wordtok transform: done"
    );

    // Re-parse to recover paragraph and sentence structure; tokenization
    // is lossless so this is stable.
    Ok(TextDoc::from_text(&join_wordtoks(&output_wordtoks)))
}

/// Apply a transform to disjoint runs of paragraphs, prefixing the
/// separator to each window after the first.
pub fn sliding_para_window_transform(
    doc: &TextDoc,
    transform: &TextDocTransform<'_>,
    settings: &WindowSettings,
) -> Result<TextDoc> {
    if settings.unit != TextUnit::Paragraphs {
        return Err(TextError::InvalidInput(format!(
            "this sliding window expects paragraphs, not {}",
            settings.unit
        )));
    }
    if settings.size != settings.shift {
        return Err(TextError::InvalidInput(
            "paragraph window transform requires equal size and shift".into(),
        ));
    }

    let windows = sliding_para_window(doc, settings.size)?;
    let nwindows = doc.size(TextUnit::Paragraphs).div_ceil(settings.size);

    tracing::info!(
        nwindows,
        window_paras = settings.size,
        doc = %doc.size_summary(),
        "Sliding paragraph transform: begin"
    );

    let mut transformed_paras = Vec::new();
    for (i, window) in windows.iter().enumerate() {
        tracing::debug!(
            window = i + 1,
            nwindows,
            input = %window.size_summary(),
            "Sliding paragraph transform: window"
        );

        let mut new_doc = transform(window)?;
        if i > 0 && !settings.separator.is_empty() {
            if let Some(first_sent) = new_doc
                .paragraphs
                .first_mut()
                .and_then(|p| p.sentences.first_mut())
            {
                first_sent.text = format!("{}{}", settings.separator, first_sent.text);
            }
        }
        transformed_paras.extend(new_doc.paragraphs);
    }

    let transformed_text = transformed_paras
        .iter()
        .map(|p| p.reassemble())
        .collect::<Vec<_>>()
        .join("\n\n");
    let new_text_doc = TextDoc::from_text(&transformed_text);

    tracing::info!(
        output = %new_text_doc.size_summary(),
        "Sliding paragraph transform: done"
    );

    Ok(new_text_doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::filters::adds_or_removes_whitespace;
    use crate::windows::settings::WINDOW_BR_SEP;

    const EXAMPLE_TEXT: &str = "\
This is the first paragraph. It has multiple sentences.

This is the second paragraph. It also has multiple sentences. And it continues.

Here is the third paragraph. More sentences follow. And here is another one.";

    fn uppercase(window: &TextDoc) -> Result<TextDoc> {
        Ok(TextDoc::from_text(&window.reassemble().to_uppercase()))
    }

    #[test]
    fn wordtok_windows_stitch_seamlessly() {
        let long_text = format!("{EXAMPLE_TEXT}\n\n").repeat(20);
        let doc = TextDoc::from_text(&long_text);

        let settings = WindowSettings::wordtoks(80, 60, 5);
        let transformed = sliding_window_transform(&doc, &uppercase, &settings).unwrap();

        assert_eq!(transformed.reassemble(), long_text.to_uppercase().trim());
    }

    #[test]
    fn wordtok_windows_splice_separators_at_boundaries() {
        let long_text = format!("{EXAMPLE_TEXT}\n\n").repeat(2);
        let doc = TextDoc::from_text(&long_text);

        let settings = WindowSettings::wordtoks(80, 60, 5).with_separator("|");
        let transformed = sliding_window_transform(&doc, &uppercase, &settings).unwrap();

        assert_eq!(transformed.reassemble().matches('|').count(), 2);
    }

    #[test]
    fn para_windows_mark_boundaries_with_window_breaks() {
        let text = (0..7)
            .map(|i| format!("Paragraph {i}."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let doc = TextDoc::from_text(&text);

        let settings = WindowSettings::paragraphs(3).with_separator(WINDOW_BR_SEP);
        let transformed = sliding_para_window_transform(&doc, &uppercase, &settings).unwrap();

        let expected = "\
PARAGRAPH 0.\n\nPARAGRAPH 1.\n\nPARAGRAPH 2.\n\n<!--window-br--> PARAGRAPH 3.\n\n\
PARAGRAPH 4.\n\nPARAGRAPH 5.\n\n<!--window-br--> PARAGRAPH 6.";
        assert_eq!(transformed.reassemble(), expected);
        assert_eq!(transformed.reassemble().matches(WINDOW_BR).count(), 2);
    }

    #[test]
    fn filter_drops_disallowed_edits_and_keeps_allowed_ones() {
        let doc = TextDoc::from_text(EXAMPLE_TEXT);

        // The transform merges the first two paragraphs (a whitespace
        // change) and also rewrites a word (not allowed by the filter).
        let transform = |window: &TextDoc| -> Result<TextDoc> {
            let text = window
                .reassemble()
                .replacen("sentences.\n\nThis", "sentences. This", 1)
                .replace("third", "3rd");
            Ok(TextDoc::from_text(&text))
        };

        let settings = WindowSettings::wordtoks(1000, 900, 5);
        let result = filtered_transform(
            &doc,
            &transform,
            Some(&settings),
            Some(&adds_or_removes_whitespace),
        )
        .unwrap();

        let text = result.reassemble();
        assert!(text.contains("sentences. This is the second paragraph."));
        assert!(text.contains("third"));
        assert!(!text.contains("3rd"));
    }

    #[test]
    fn no_windowing_applies_the_transform_directly() {
        let doc = TextDoc::from_text(EXAMPLE_TEXT);
        let result = filtered_transform(&doc, &uppercase, None, None).unwrap();
        assert_eq!(result.reassemble(), doc.reassemble().to_uppercase());
    }

    #[test]
    fn window_br_markers_are_stripped_from_inputs() {
        let text = format!("First paragraph here.\n\n{WINDOW_BR}\n\nSecond paragraph here.");
        let doc = TextDoc::from_text(&text);

        let seen = std::cell::RefCell::new(Vec::new());
        let transform = |window: &TextDoc| -> Result<TextDoc> {
            seen.borrow_mut().push(window.reassemble());
            Ok(window.clone())
        };

        let settings = WindowSettings::wordtoks(1000, 900, 1);
        filtered_transform(&doc, &transform, Some(&settings), None).unwrap();
        for input in seen.borrow().iter() {
            assert!(!input.contains(WINDOW_BR));
        }
    }

    #[test]
    fn invalid_window_shapes_are_rejected() {
        let doc = TextDoc::from_text(EXAMPLE_TEXT);
        let bad_unit = WindowSettings {
            unit: TextUnit::Bytes,
            size: 80,
            shift: 60,
            min_overlap: 5,
            separator: String::new(),
        };
        assert!(sliding_window_transform(&doc, &uppercase, &bad_unit).is_err());

        let no_overlap = WindowSettings::wordtoks(60, 60, 5);
        assert!(sliding_window_transform(&doc, &uppercase, &no_overlap).is_err());

        let mut uneven = WindowSettings::paragraphs(3);
        uneven.shift = 2;
        assert!(sliding_para_window_transform(&doc, &uppercase, &uneven).is_err());
    }
}
