//! Error kinds shared across the toolkit.

use thiserror::Error;

/// Errors produced while measuring or transforming text.
///
/// The variants carry distinct handling policies: invalid input and
/// malformed collaborator results surface immediately, content errors are
/// recoverable at per-window or per-citation granularity, and unexpected
/// errors are internal invariant violations that abort the whole pass.
#[derive(Debug, Error)]
pub enum TextError {
    /// A precondition on caller-supplied data failed (empty body, bad offset).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Data was present but unsuitable (no timestamp found, window too small).
    /// Callers may log and continue at the granularity of the affected item.
    #[error("content error: {0}")]
    Content(String),
    /// An internal invariant was violated. Fatal for the current pass.
    #[error("unexpected error: {0}")]
    Unexpected(String),
    /// An external collaborator returned malformed data.
    #[error("bad result from collaborator: {0}")]
    ApiResult(String),
    /// Tokenizer resources were unavailable for the configured encoding.
    #[error("failed to initialize tokenizer for encoding '{encoding}': {source}")]
    Tokenizer {
        /// Subword encoding we attempted to load.
        encoding: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: anyhow::Error,
    },
}

impl TextError {
    /// True when the error is recoverable at per-item granularity.
    pub fn is_content_error(&self) -> bool {
        matches!(self, TextError::Content(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TextError>;
