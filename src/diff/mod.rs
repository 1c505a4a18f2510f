//! LCS-style diffs over wordtok sequences.
//!
//! A [`TokenDiff`] is an ordered edit script of EQUAL / INSERT / DELETE /
//! REPLACE operations. Scripts can be applied back to the input, split by
//! a filter into accepted and rejected halves, and scored for the overlap
//! alignment search used when stitching sliding windows.

pub mod filters;
pub mod mapping;

pub use mapping::TokenMapping;

use std::fmt;

use similar::{Algorithm, DiffOp as SimilarOp, capture_diff_slices};

use crate::doc::TextDoc;
use crate::error::{Result, TextError};
use crate::tokens::{SYMBOL_SEP, Wordtok};

/// Kind of a single diff operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Both sides identical.
    Equal,
    /// Tokens present only on the right.
    Insert,
    /// Tokens present only on the left.
    Delete,
    /// Tokens replaced wholesale.
    Replace,
}

impl OpKind {
    fn as_abbrev(self) -> &'static str {
        match self {
            OpKind::Equal => "keep",
            OpKind::Insert => "add ",
            OpKind::Delete => "del ",
            OpKind::Replace => "repl",
        }
    }
}

/// One operation in an edit script.
///
/// Shape invariants: EQUAL has identical sides, INSERT an empty left,
/// DELETE an empty right, REPLACE two non-empty sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOp {
    /// What the operation does.
    pub kind: OpKind,
    /// Tokens consumed from the input.
    pub left: Vec<Wordtok>,
    /// Tokens produced in the output.
    pub right: Vec<Wordtok>,
}

impl DiffOp {
    /// An equality op over the given tokens.
    pub fn equal(toks: Vec<Wordtok>) -> Self {
        Self {
            kind: OpKind::Equal,
            left: toks.clone(),
            right: toks,
        }
    }

    /// An insertion of the given tokens.
    pub fn insert(right: Vec<Wordtok>) -> Self {
        debug_assert!(!right.is_empty());
        Self {
            kind: OpKind::Insert,
            left: Vec::new(),
            right,
        }
    }

    /// A deletion of the given tokens.
    pub fn delete(left: Vec<Wordtok>) -> Self {
        debug_assert!(!left.is_empty());
        Self {
            kind: OpKind::Delete,
            left,
            right: Vec::new(),
        }
    }

    /// A replacement of `left` by `right`.
    pub fn replace(left: Vec<Wordtok>, right: Vec<Wordtok>) -> Self {
        debug_assert!(!left.is_empty() && !right.is_empty());
        Self {
            kind: OpKind::Replace,
            left,
            right,
        }
    }

    /// All tokens touched by the op; empty for equalities.
    pub fn all_changed(&self) -> Vec<&Wordtok> {
        if self.kind == OpKind::Equal {
            Vec::new()
        } else {
            self.left.iter().chain(self.right.iter()).collect()
        }
    }

    fn side_str(&self, marker: &str, toks: &[Wordtok]) -> String {
        let joined: String = toks.iter().map(|t| t.token_str()).collect();
        format!(
            "{} {:4} toks: {marker} {SYMBOL_SEP}{joined}{SYMBOL_SEP}",
            self.kind.as_abbrev(),
            toks.len()
        )
    }
}

/// Token counts for the changed portion of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffStats {
    /// Tokens added by non-equal ops.
    pub added: usize,
    /// Tokens removed by non-equal ops.
    pub removed: usize,
    /// Total input (left) size of the diff.
    pub input_size: usize,
}

impl DiffStats {
    /// Total number of changed tokens.
    pub fn nchanges(&self) -> usize {
        self.added + self.removed
    }
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "add/remove +{}/-{} out of {} total",
            self.added, self.removed, self.input_size
        )
    }
}

/// Predicate over a single diff op, used to partition an edit script.
pub type DiffFilter<'a> = dyn Fn(&DiffOp) -> bool + 'a;

/// An ordered edit script between two wordtok sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDiff {
    /// Operations in input order.
    pub ops: Vec<DiffOp>,
}

impl TokenDiff {
    /// Total tokens consumed from the input.
    pub fn left_size(&self) -> usize {
        self.ops.iter().map(|op| op.left.len()).sum()
    }

    /// Total tokens produced in the output.
    pub fn right_size(&self) -> usize {
        self.ops.iter().map(|op| op.right.len()).sum()
    }

    /// The non-equal operations.
    pub fn changes(&self) -> Vec<&DiffOp> {
        self.ops.iter().filter(|op| op.kind != OpKind::Equal).collect()
    }

    /// Added/removed/input token counts.
    pub fn stats(&self) -> DiffStats {
        let added = self
            .ops
            .iter()
            .filter(|op| op.kind != OpKind::Equal)
            .map(|op| op.right.len())
            .sum();
        let removed = self
            .ops
            .iter()
            .filter(|op| op.kind != OpKind::Equal)
            .map(|op| op.left.len())
            .sum();
        DiffStats {
            added,
            removed,
            input_size: self.left_size(),
        }
    }

    /// Apply the complete edit script to the original tokens, producing
    /// the right-hand sequence. The script must consume exactly the
    /// input; a length mismatch is an internal invariant violation.
    pub fn apply_to(&self, original: &[Wordtok]) -> Result<Vec<Wordtok>> {
        if original.len() != self.left_size() {
            return Err(TextError::Unexpected(format!(
                "diff should be complete: original length {} != diff left size {}",
                original.len(),
                self.left_size()
            )));
        }
        let mut result = Vec::with_capacity(self.right_size());
        for op in &self.ops {
            result.extend(op.right.iter().cloned());
        }
        Ok(result)
    }

    /// Split into accepted and rejected scripts. Each non-equal op is
    /// accepted or rejected as a whole; the other script gets an equality
    /// placeholder over the op's left tokens, so both outputs keep the
    /// input's left size and can be applied to the original.
    pub fn filter(&self, accept_fn: &DiffFilter<'_>) -> (TokenDiff, TokenDiff) {
        let mut accepted_ops = Vec::with_capacity(self.ops.len());
        let mut rejected_ops = Vec::with_capacity(self.ops.len());

        for op in &self.ops {
            if op.kind == OpKind::Equal {
                accepted_ops.push(op.clone());
                rejected_ops.push(op.clone());
            } else if accept_fn(op) {
                accepted_ops.push(op.clone());
                rejected_ops.push(DiffOp::equal(op.left.clone()));
            } else {
                accepted_ops.push(DiffOp::equal(op.left.clone()));
                rejected_ops.push(op.clone());
            }
        }

        let accepted = TokenDiff { ops: accepted_ops };
        let rejected = TokenDiff { ops: rejected_ops };
        debug_assert_eq!(accepted.left_size(), self.left_size());
        debug_assert_eq!(rejected.left_size(), self.left_size());
        (accepted, rejected)
    }

    /// Render the changed ops (and optionally equalities) with positions.
    pub fn as_diff_str(&self, include_equal: bool) -> String {
        if self.ops.is_empty() {
            return format!("TokenDiff: {}:\n(No changes)", self.stats());
        }
        let mut pos = 0;
        let mut lines = Vec::new();
        for op in &self.ops {
            match op.kind {
                OpKind::Equal => {
                    if include_equal {
                        lines.push(format!("at pos {pos:4} {}", op.side_str(" ", &op.left)));
                    }
                }
                OpKind::Insert => {
                    lines.push(format!("at pos {pos:4} {}", op.side_str("+", &op.right)));
                }
                OpKind::Delete => {
                    lines.push(format!("at pos {pos:4} {}", op.side_str("-", &op.left)));
                }
                OpKind::Replace => {
                    lines.push(format!("at pos {pos:4} {}", op.side_str("-", &op.left)));
                    lines.push(format!("       {:4} {}", "", op.side_str("+", &op.right)));
                }
            }
            pos += op.left.len();
        }
        format!("TokenDiff: {}:\n{}", self.stats(), lines.join("\n"))
    }
}

impl fmt::Display for TokenDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_diff_str(false))
    }
}

/// LCS diff between two wordtok sequences. Adjacent delete/insert pairs
/// are coalesced into replace ops; op order follows the input.
pub fn diff_wordtoks(wordtoks1: &[Wordtok], wordtoks2: &[Wordtok]) -> TokenDiff {
    let mut ops: Vec<DiffOp> = Vec::new();
    for op in capture_diff_slices(Algorithm::Myers, wordtoks1, wordtoks2) {
        let next = match op {
            SimilarOp::Equal { old_index, len, .. } => {
                DiffOp::equal(wordtoks1[old_index..old_index + len].to_vec())
            }
            SimilarOp::Delete {
                old_index, old_len, ..
            } => DiffOp::delete(wordtoks1[old_index..old_index + old_len].to_vec()),
            SimilarOp::Insert {
                new_index, new_len, ..
            } => DiffOp::insert(wordtoks2[new_index..new_index + new_len].to_vec()),
            SimilarOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => DiffOp::replace(
                wordtoks1[old_index..old_index + old_len].to_vec(),
                wordtoks2[new_index..new_index + new_len].to_vec(),
            ),
        };
        match (ops.last().map(|op| op.kind), next.kind) {
            (Some(OpKind::Delete), OpKind::Insert) => {
                let prev = ops.pop().expect("ops non-empty");
                ops.push(DiffOp::replace(prev.left, next.right));
            }
            (Some(OpKind::Insert), OpKind::Delete) => {
                let prev = ops.pop().expect("ops non-empty");
                ops.push(DiffOp::replace(next.left, prev.right));
            }
            _ => ops.push(next),
        }
    }
    TokenDiff { ops }
}

/// LCS diff between two documents, over their wordtoks.
pub fn diff_docs(doc1: &TextDoc, doc2: &TextDoc) -> TokenDiff {
    diff_wordtoks(&doc1.as_wordtoks(false), &doc2.as_wordtoks(false))
}

/// Diff two sequences and score the churn: changed tokens over the
/// shorter input, zero for identical sequences.
pub fn scored_diff_wordtoks(
    wordtoks1: &[Wordtok],
    wordtoks2: &[Wordtok],
) -> Result<(f64, TokenDiff)> {
    if wordtoks1.is_empty() || wordtoks2.is_empty() {
        return Err(TextError::InvalidInput(
            "cannot score diff for empty documents".into(),
        ));
    }
    let diff = diff_wordtoks(wordtoks1, wordtoks2);
    let score =
        diff.stats().nchanges() as f64 / wordtoks1.len().min(wordtoks2.len()) as f64;
    Ok((score, diff))
}

/// Knobs for the alignment search's early-termination heuristic.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentParams {
    /// Scores at or above this are candidates for giving up.
    pub give_up_score: f64,
    /// Consecutive non-decreasing high scores before giving up.
    pub give_up_count: usize,
}

impl Default for AlignmentParams {
    fn default() -> Self {
        Self {
            give_up_score: 0.75,
            give_up_count: 30,
        }
    }
}

/// A chosen splice point between accumulated output and a new window.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Offset into the first sequence where the second should be spliced.
    pub offset: usize,
    /// Edit-distance score of the winning overlap (0 for a perfect match).
    pub score: f64,
    /// Diff of the winning overlap.
    pub diff: TokenDiff,
}

/// Find the overlap of `list2`'s head with `list1`'s tail that minimizes
/// edit distance, trying overlap lengths from `min_overlap` up to
/// `max_overlap` (default: the shorter list). Returns the offset into
/// `list1` at which `list2` best aligns.
pub fn find_best_alignment(
    list1: &[Wordtok],
    list2: &[Wordtok],
    min_overlap: usize,
    max_overlap: Option<usize>,
) -> Result<Alignment> {
    find_best_alignment_with(list1, list2, min_overlap, max_overlap, AlignmentParams::default())
}

/// [`find_best_alignment`] with explicit early-termination parameters.
pub fn find_best_alignment_with(
    list1: &[Wordtok],
    list2: &[Wordtok],
    min_overlap: usize,
    max_overlap: Option<usize>,
    params: AlignmentParams,
) -> Result<Alignment> {
    let (len1, len2) = (list1.len(), list2.len());
    if min_overlap > len1 || min_overlap > len2 {
        return Err(TextError::InvalidInput(format!(
            "minimum overlap {min_overlap} exceeds a list length ({len1}, {len2})"
        )));
    }
    let min_overlap = min_overlap.max(1);
    let max_overlap = max_overlap.map_or(len1.min(len2), |m| m.min(len1).min(len2));

    tracing::debug!(
        len1,
        len2,
        min_overlap,
        max_overlap,
        "Finding best alignment"
    );

    let mut best: Option<Alignment> = None;
    let mut scores_increasing = 0;
    let mut prev_score = f64::NEG_INFINITY;

    for overlap in min_overlap..=max_overlap {
        let start1 = len1 - overlap;
        let (score, diff) = scored_diff_wordtoks(&list1[start1..], &list2[..overlap])?;

        tracing::trace!(offset = start1, overlap, score, "Alignment candidate");

        if best.as_ref().is_none_or(|b| score < b.score) {
            best = Some(Alignment {
                offset: start1,
                score,
                diff,
            });
            scores_increasing = 0;
        } else if score >= params.give_up_score && score >= prev_score {
            scores_increasing += 1;
            if scores_increasing >= params.give_up_count {
                tracing::debug!(
                    give_up_count = params.give_up_count,
                    score,
                    "Giving up alignment search after a run of increasing scores"
                );
                break;
            }
        }
        prev_score = score;
    }

    best.ok_or_else(|| TextError::InvalidInput("no alignment found".into()))
}
