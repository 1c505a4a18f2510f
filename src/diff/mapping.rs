//! Back-mapping from a derived wordtok sequence to its source.
//!
//! Built from the LCS diff of the two sequences: each index in the
//! derived sequence maps to the last source token consumed up to that
//! point, so per-token annotations (timestamps, provenance) can be
//! transplanted across transformations.

use std::fmt;

use crate::diff::{OpKind, TokenDiff, diff_wordtoks};
use crate::error::{Result, TextError};
use crate::tokens::{SYMBOL_SEP, Wordtok};

/// Default minimum wordtok count for each sequence.
pub const MIN_WORDTOKS: usize = 10;

/// Default maximum fraction of changed ops per source token.
pub const MAX_DIFF_FRAC: f64 = 0.4;

/// Mapping from offsets in a derived token sequence back to offsets in
/// the source sequence it was produced from.
pub struct TokenMapping {
    wordtoks1: Vec<Wordtok>,
    wordtoks2: Vec<Wordtok>,
    /// The diff the mapping was derived from.
    pub diff: TokenDiff,
    backmap: Vec<usize>,
}

impl TokenMapping {
    /// Build a mapping with the default validation thresholds.
    pub fn new(wordtoks1: Vec<Wordtok>, wordtoks2: Vec<Wordtok>) -> Result<Self> {
        Self::with_thresholds(wordtoks1, wordtoks2, MIN_WORDTOKS, MAX_DIFF_FRAC)
    }

    /// Build a mapping, requiring each sequence to have at least
    /// `min_wordtoks` tokens and the diff to change at most
    /// `max_diff_frac` ops per source token.
    pub fn with_thresholds(
        wordtoks1: Vec<Wordtok>,
        wordtoks2: Vec<Wordtok>,
        min_wordtoks: usize,
        max_diff_frac: f64,
    ) -> Result<Self> {
        if wordtoks1.len() < min_wordtoks || wordtoks2.len() < min_wordtoks {
            return Err(TextError::InvalidInput(format!(
                "documents should have at least {min_wordtoks} wordtoks"
            )));
        }
        let diff = diff_wordtoks(&wordtoks1, &wordtoks2);
        let nchanges = diff.changes().len();
        let frac = nchanges as f64 / wordtoks1.len() as f64;
        if frac > max_diff_frac {
            return Err(TextError::InvalidInput(format!(
                "documents have too many changes: {nchanges}/{} ({frac:.2} > {max_diff_frac})",
                wordtoks1.len()
            )));
        }
        let backmap = create_backmap(&diff);
        debug_assert_eq!(backmap.len(), wordtoks2.len());
        Ok(Self {
            wordtoks1,
            wordtoks2,
            diff,
            backmap,
        })
    }

    /// Map an offset in the derived sequence back to the source sequence.
    pub fn map_back(&self, offset2: usize) -> usize {
        self.backmap[offset2]
    }

    /// The source token sequence.
    pub fn source_wordtoks(&self) -> &[Wordtok] {
        &self.wordtoks1
    }

    /// The derived token sequence.
    pub fn derived_wordtoks(&self) -> &[Wordtok] {
        &self.wordtoks2
    }

    /// Dump every mapping entry, one per line, for debugging.
    pub fn full_mapping_str(&self) -> String {
        (0..self.wordtoks2.len())
            .map(|i| {
                let back = self.map_back(i);
                format!(
                    "{i} {SYMBOL_SEP}{}{SYMBOL_SEP} -> {back} {SYMBOL_SEP}{}{SYMBOL_SEP}",
                    self.wordtoks2[i], self.wordtoks1[back]
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for TokenMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TokenMapping(source len {}, derived len {}, mapping len {})",
            self.wordtoks1.len(),
            self.wordtoks2.len(),
            self.backmap.len()
        )
    }
}

fn create_backmap(diff: &TokenDiff) -> Vec<usize> {
    let mut backmap = Vec::with_capacity(diff.right_size());
    let mut offset1 = 0;
    let mut last_offset1 = 0;

    for op in &diff.ops {
        match op.kind {
            OpKind::Equal => {
                for _ in &op.left {
                    backmap.push(offset1);
                    last_offset1 = offset1;
                    offset1 += 1;
                }
            }
            OpKind::Delete => {
                for _ in &op.left {
                    last_offset1 = offset1;
                    offset1 += 1;
                }
            }
            OpKind::Insert => {
                for _ in &op.right {
                    backmap.push(last_offset1);
                }
            }
            OpKind::Replace => {
                for _ in &op.left {
                    last_offset1 = offset1;
                    offset1 += 1;
                }
                for _ in &op.right {
                    backmap.push(last_offset1);
                }
            }
        }
    }
    backmap
}
