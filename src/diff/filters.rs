//! Standard diff filters and a token-sequence pattern matcher.
//!
//! A filter is a predicate over a single [`DiffOp`]; it partitions an edit
//! script into accepted and rejected halves, constraining a transform to a
//! declared class of edits (whitespace only, headings only, and so on).

use crate::diff::{DiffOp, OpKind};
use crate::tokens::Wordtok;

/// One element of a token-sequence pattern.
pub enum TokenPattern {
    /// Match a token whose literal form equals this string.
    Literal(&'static str),
    /// Match a token satisfying this predicate.
    Pred(fn(&Wordtok) -> bool),
    /// Match any number of tokens, including zero.
    Wildcard,
}

/// Accepts every change.
pub fn accept_all(_op: &DiffOp) -> bool {
    true
}

/// Accepts only changes to sentence/paragraph breaks and whitespace.
pub fn adds_or_removes_whitespace(op: &DiffOp) -> bool {
    op.all_changed().iter().all(|tok| tok.is_break_or_space())
}

/// Accepts only changes to punctuation and whitespace (no words).
pub fn adds_or_removes_punct_whitespace(op: &DiffOp) -> bool {
    op.all_changed().iter().all(|tok| !tok.is_word())
}

/// Accepts only insertions whose content is wrapped in heading tags.
pub fn adds_headings(op: &DiffOp) -> bool {
    const HEADERS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];
    let pattern = [
        TokenPattern::Pred(|tok| tok.is_tag_open(Some(&HEADERS))),
        TokenPattern::Wildcard,
        TokenPattern::Pred(|tok| tok.is_tag_close(Some(&HEADERS))),
    ];
    matches_op(op, &pattern, Some(OpKind::Insert), Some(Wordtok::is_break_or_space))
}

/// Does the op's changed-token sequence match a pattern, optionally
/// restricted to one op kind and ignoring tokens matching `ignore`?
pub fn matches_op(
    op: &DiffOp,
    pattern: &[TokenPattern],
    kind: Option<OpKind>,
    ignore: Option<fn(&Wordtok) -> bool>,
) -> bool {
    if kind.is_some_and(|kind| op.kind != kind) {
        return false;
    }
    let mut tokens = op.all_changed();
    if let Some(ignore) = ignore {
        tokens.retain(|tok| !ignore(tok));
    }
    matches_pattern(&tokens, pattern)
}

fn matches_pattern(tokens: &[&Wordtok], pattern: &[TokenPattern]) -> bool {
    match_from(tokens, pattern, 0, 0)
}

fn match_from(tokens: &[&Wordtok], pattern: &[TokenPattern], mut i: usize, mut j: usize) -> bool {
    while j < pattern.len() {
        match &pattern[j] {
            TokenPattern::Wildcard => {
                // A trailing wildcard matches any remaining tokens.
                if j + 1 == pattern.len() {
                    return true;
                }
                j += 1;
                while i < tokens.len() {
                    if match_from(tokens, pattern, i, j) {
                        return true;
                    }
                    i += 1;
                }
                // The rest of the pattern may still match zero tokens.
                return match_from(tokens, pattern, i, j);
            }
            TokenPattern::Literal(lit) => {
                if i >= tokens.len() || tokens[i].token_str() != *lit {
                    return false;
                }
                i += 1;
                j += 1;
            }
            TokenPattern::Pred(pred) => {
                if i >= tokens.len() || !pred(tokens[i]) {
                    return false;
                }
                i += 1;
                j += 1;
            }
        }
    }
    i == tokens.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_wordtoks;
    use crate::diff::tests::{SHORT_TEXT_1, SHORT_TEXT_2, wordtoks_of};

    // All the whitespace and break-only changes from text 1 to text 2.
    const SHORT_TEXT_3: &str = "\
Paragraph one. Sentence 1a. Sentence 1b. Sentence 1c.
Paragraph two. Sentence 2a. Sentence 2b. Sentence 2c.

Paragraph three. Sentence 3a. Sentence 3b. Sentence 3c.";

    #[test]
    fn whitespace_filter_keeps_break_changes_only() {
        let wordtoks1 = wordtoks_of(SHORT_TEXT_1);
        let wordtoks2 = wordtoks_of(SHORT_TEXT_2);
        let wordtoks3 = wordtoks_of(SHORT_TEXT_3);

        let diff = diff_wordtoks(&wordtoks1, &wordtoks2);
        let (accepted, rejected) = diff.filter(&adds_or_removes_whitespace);

        assert_eq!(accepted.left_size(), diff.left_size());
        assert_eq!(rejected.left_size(), diff.left_size());
        assert_eq!(accepted.apply_to(&wordtoks1).unwrap(), wordtoks3);
    }

    #[test]
    fn accept_all_leaves_nothing_rejected() {
        let wordtoks1 = wordtoks_of(SHORT_TEXT_1);
        let wordtoks2 = wordtoks_of(SHORT_TEXT_2);
        let diff = diff_wordtoks(&wordtoks1, &wordtoks2);

        let (accepted, rejected) = diff.filter(&accept_all);
        assert_eq!(accepted.apply_to(&wordtoks1).unwrap(), wordtoks2);
        assert_eq!(rejected.apply_to(&wordtoks1).unwrap(), wordtoks1);
    }

    #[test]
    fn punct_whitespace_filter_rejects_word_changes() {
        let wordtoks1 = wordtoks_of(SHORT_TEXT_1);
        let wordtoks2 = wordtoks_of(SHORT_TEXT_2);
        let diff = diff_wordtoks(&wordtoks1, &wordtoks2);

        let (accepted, _rejected) = diff.filter(&adds_or_removes_punct_whitespace);
        let result = accepted.apply_to(&wordtoks1).unwrap();
        // Break and punctuation changes land; "blah" and the deleted
        // trailing sentence (which contains words) do not.
        assert!(!result.contains(&Wordtok::Word("blah".into())));
        assert!(result.contains(&Wordtok::Punct('!')));
        assert!(result.contains(&Wordtok::Word("3c".into())));
    }

    #[test]
    fn heading_filter_accepts_only_wrapped_inserts() {
        let h_open = Wordtok::Tag("<h1>".into());
        let h_close = Wordtok::Tag("</h1>".into());
        let title = Wordtok::Word("Title".into());

        let insert_op = DiffOp::insert(vec![
            Wordtok::SentBreak,
            h_open.clone(),
            title.clone(),
            h_close.clone(),
            Wordtok::ParaBreak,
        ]);
        assert!(adds_headings(&insert_op));

        let delete_op = DiffOp::delete(vec![h_open.clone(), title.clone(), h_close.clone()]);
        assert!(!adds_headings(&delete_op));

        let replace_op = DiffOp::replace(
            vec![Wordtok::Word("Some".into())],
            vec![Wordtok::Word("New".into())],
        );
        assert!(!adds_headings(&replace_op));

        let bare_insert = DiffOp::insert(vec![title.clone()]);
        assert!(!adds_headings(&bare_insert));

        let unclosed = DiffOp::insert(vec![h_open, title]);
        assert!(!adds_headings(&unclosed));
    }

    #[test]
    fn wildcard_patterns_match_like_globs() {
        let toks = [
            Wordtok::Tag("<h2>".into()),
            Wordtok::Word("Two".into()),
            Wordtok::Word("Words".into()),
            Wordtok::Tag("</h2>".into()),
        ];
        let refs: Vec<&Wordtok> = toks.iter().collect();
        let pattern = [
            TokenPattern::Literal("<h2>"),
            TokenPattern::Wildcard,
            TokenPattern::Literal("</h2>"),
        ];
        assert!(matches_pattern(&refs, &pattern));
        assert!(matches_pattern(
            &refs[..0],
            &[TokenPattern::Wildcard]
        ));
        assert!(!matches_pattern(&refs[..2], &pattern));
    }
}
