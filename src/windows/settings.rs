//! Sliding-window sizing and the window-break marker convention.

use std::fmt;

use crate::doc::TextUnit;

/// Marker inserted into result documents to show where window breaks
/// occurred.
pub const WINDOW_BR: &str = "<!--window-br-->";

/// Window-break marker on its own line, as spliced between windows.
pub const WINDOW_BR_SEP: &str = "\n<!--window-br-->\n";

/// Size of a sliding window, how far it advances, and the minimum overlap
/// required when stitching outputs together.
///
/// Wordtok windows must overlap (`shift < size`, `min_overlap <= shift`);
/// paragraph windows are disjoint (`shift == size`, `min_overlap == 0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSettings {
    /// Unit the window is measured in (wordtoks or paragraphs).
    pub unit: TextUnit,
    /// Window size in `unit`.
    pub size: usize,
    /// How far the window advances per step, in `unit`.
    pub shift: usize,
    /// Minimum overlap required for alignment, in wordtoks.
    pub min_overlap: usize,
    /// Separator text spliced in at window boundaries, if any.
    pub separator: String,
}

impl WindowSettings {
    /// Sliding, overlapping wordtok window. Useful for finding paragraph
    /// breaks; 2K wordtoks is several paragraphs.
    pub fn window_2k_wordtoks() -> Self {
        Self {
            unit: TextUnit::Wordtoks,
            size: 2048,
            shift: 2048 - 256,
            min_overlap: 8,
            separator: WINDOW_BR_SEP.to_string(),
        }
    }

    /// Process `nparas` paragraphs at a time, with window-break markers
    /// between windows.
    pub fn paragraphs(nparas: usize) -> Self {
        Self {
            unit: TextUnit::Paragraphs,
            size: nparas,
            shift: nparas,
            min_overlap: 0,
            separator: WINDOW_BR_SEP.to_string(),
        }
    }

    /// A wordtok window with explicit size, shift, and overlap and no
    /// separator.
    pub fn wordtoks(size: usize, shift: usize, min_overlap: usize) -> Self {
        Self {
            unit: TextUnit::Wordtoks,
            size,
            shift,
            min_overlap,
            separator: String::new(),
        }
    }

    /// Replace the separator text.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

impl fmt::Display for WindowSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "windowing size={}, shift={}, min_overlap={} {}",
            self.size, self.shift, self.min_overlap, self.unit
        )
    }
}
