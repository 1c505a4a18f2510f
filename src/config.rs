//! Environment-driven configuration for the toolkit.
//!
//! Settings are loaded and validated once at startup (via `init_config`)
//! and exposed through a global, read-only view (`get_config`). The
//! configuration covers:
//!
//! - Sentence splitting (`SENTENCE_SPLITTER`, `SENTENCE_MIN_LENGTH`).
//! - Subword token counting (`TIKTOKEN_ENCODING`).
//! - Markdown normalization (`MARKDOWN_WRAP_WIDTH`).
//! - Window alignment search (`ALIGNMENT_GIVE_UP_SCORE`,
//!   `ALIGNMENT_GIVE_UP_COUNT`).
//! - Optional file logging (`TEXTLOOM_LOG_FILE`).
//!
//! Every field has a sensible default; invalid combinations are flagged
//! early with descriptive errors so misconfiguration is easy to diagnose.
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

use crate::diff::AlignmentParams;
use crate::doc::{RegexSentenceSplitter, SENTENCE_MIN_LENGTH};
use crate::markdown::DEFAULT_WRAP_WIDTH;

/// Errors encountered while loading configuration from environment
/// variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Which sentence splitter to use when parsing documents.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SplitterKind {
    /// Fast regex heuristic, built in.
    Regex,
    /// External NLP splitter, plugged in by the caller.
    Nlp,
}

/// Runtime configuration for the toolkit.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Sentence splitter selection.
    pub sentence_splitter: SplitterKind,
    /// Minimum sentence length in characters for the regex splitter.
    pub sentence_min_length: usize,
    /// Encoding name used for subword token counting.
    pub tiktoken_encoding: String,
    /// Wrap width for Markdown normalization.
    pub markdown_wrap_width: usize,
    /// Alignment search: scores at or above this may trigger give-up.
    pub alignment_give_up_score: f64,
    /// Alignment search: consecutive non-decreasing high scores before
    /// giving up.
    pub alignment_give_up_count: usize,
    /// Optional path to append logs to; file logging is off when unset.
    pub log_file: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, performing
    /// validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let sentence_min_length =
            load_usize_with_default("SENTENCE_MIN_LENGTH", SENTENCE_MIN_LENGTH)?;
        let markdown_wrap_width =
            load_usize_with_default("MARKDOWN_WRAP_WIDTH", DEFAULT_WRAP_WIDTH)?;
        let alignment_give_up_score = load_f64_with_default("ALIGNMENT_GIVE_UP_SCORE", 0.75)?;
        let alignment_give_up_count = load_usize_with_default("ALIGNMENT_GIVE_UP_COUNT", 30)?;

        if sentence_min_length == 0 {
            return Err(ConfigError::InvalidValue(
                "SENTENCE_MIN_LENGTH must be at least 1".into(),
            ));
        }
        if markdown_wrap_width < 20 {
            return Err(ConfigError::InvalidValue(
                "MARKDOWN_WRAP_WIDTH must be at least 20".into(),
            ));
        }
        if alignment_give_up_score <= 0.0 {
            return Err(ConfigError::InvalidValue(
                "ALIGNMENT_GIVE_UP_SCORE must be positive".into(),
            ));
        }
        if alignment_give_up_count == 0 {
            return Err(ConfigError::InvalidValue(
                "ALIGNMENT_GIVE_UP_COUNT must be at least 1".into(),
            ));
        }

        Ok(Self {
            sentence_splitter: match load_env_optional("SENTENCE_SPLITTER").as_deref() {
                None => SplitterKind::Regex,
                Some(value) => match value.to_lowercase().as_str() {
                    "regex" => SplitterKind::Regex,
                    "nlp" => SplitterKind::Nlp,
                    _ => {
                        return Err(ConfigError::InvalidValue("SENTENCE_SPLITTER".into()));
                    }
                },
            },
            sentence_min_length,
            tiktoken_encoding: load_env_optional("TIKTOKEN_ENCODING")
                .unwrap_or_else(|| "cl100k_base".to_string()),
            markdown_wrap_width,
            alignment_give_up_score,
            alignment_give_up_count,
            log_file: load_env_optional("TEXTLOOM_LOG_FILE"),
        })
    }

    /// The regex sentence splitter configured by these settings.
    pub fn regex_splitter(&self) -> RegexSentenceSplitter {
        RegexSentenceSplitter::new(self.sentence_min_length)
    }

    /// Alignment-search parameters configured by these settings.
    pub fn alignment_params(&self) -> AlignmentParams {
        AlignmentParams {
            give_up_score: self.alignment_give_up_score,
            give_up_count: self.alignment_give_up_count,
        }
    }
}

fn load_usize_with_default(key: &str, default: usize) -> Result<usize, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn load_f64_with_default(key: &str, default: f64) -> Result<f64, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not
/// occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global
/// cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        sentence_splitter = ?config.sentence_splitter,
        sentence_min_length = config.sentence_min_length,
        tiktoken_encoding = %config.tiktoken_encoding,
        markdown_wrap_width = config.markdown_wrap_width,
        alignment_give_up_score = config.alignment_give_up_score,
        alignment_give_up_count = config.alignment_give_up_count,
        log_file = ?config.log_file,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
