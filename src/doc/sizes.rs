//! Text units of measure and size accounting.
//!
//! Sizes can be measured in bytes, chars, words, wordtoks, sentences,
//! paragraphs, or subword tokens ("tiktokens"). Subword counting prefers
//! the encoding named by the caller and falls back to `cl100k_base` for
//! unknown names, mirroring how unknown models are handled elsewhere in
//! the ecosystem.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use tiktoken_rs::{CoreBPE, cl100k_base, get_bpe_from_model, o200k_base, p50k_base, p50k_edit, r50k_base};

use crate::error::{Result, TextError};
use crate::tokens::{PARA_BR_STR, SENT_BR_STR, tokenize};

/// Units in which text sizes are measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextUnit {
    /// UTF-8 bytes.
    Bytes,
    /// Unicode scalar values.
    Chars,
    /// Whitespace-separated words, with HTML tags stripped first.
    Words,
    /// Word tokens, including sentence and paragraph break markers.
    Wordtoks,
    /// Sentences.
    Sentences,
    /// Paragraphs.
    Paragraphs,
    /// Subword tokens from the configured tiktoken encoding.
    Tiktokens,
}

impl std::fmt::Display for TextUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TextUnit::Bytes => "bytes",
            TextUnit::Chars => "chars",
            TextUnit::Words => "words",
            TextUnit::Wordtoks => "wordtoks",
            TextUnit::Sentences => "sentences",
            TextUnit::Paragraphs => "paragraphs",
            TextUnit::Tiktokens => "tiktokens",
        };
        write!(f, "{name}")
    }
}

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^<>]{0,1024}>").expect("valid regex"));

static DEFAULT_ENCODER: LazyLock<CoreBPE> =
    LazyLock::new(|| cl100k_base().expect("embedded cl100k_base encoding"));

/// Size of a string in UTF-8 bytes.
pub fn size_in_bytes(text: &str) -> usize {
    text.len()
}

/// Size of a string in wordtoks.
pub fn size_in_wordtoks(text: &str) -> usize {
    tokenize(text, false).len()
}

/// Strip HTML tags, leaving plain text. Rough but adequate for word counts.
pub fn html_to_plaintext(text: &str) -> String {
    TAG_RE.replace_all(text, "").into_owned()
}

/// Measure a string in the given unit.
///
/// Sentence and paragraph counts require document structure and are not
/// measurable on a bare string; asking for them is an internal error.
pub fn size(text: &str, unit: TextUnit) -> Result<usize> {
    match unit {
        TextUnit::Bytes => Ok(size_in_bytes(text)),
        TextUnit::Chars => Ok(text.chars().count()),
        TextUnit::Words => Ok(html_to_plaintext(text).split_whitespace().count()),
        TextUnit::Wordtoks => Ok(size_in_wordtoks(text)),
        TextUnit::Tiktokens => Ok(default_tiktoken_len(text)),
        TextUnit::Sentences | TextUnit::Paragraphs => Err(TextError::Unexpected(format!(
            "unsupported unit for a string: {unit}"
        ))),
    }
}

/// Per-unit sizes of the sentence and paragraph break strings, for the
/// units that admit linear seeking.
pub(crate) fn break_sizes(unit: TextUnit) -> Result<(usize, usize)> {
    match unit {
        TextUnit::Bytes => Ok((size_in_bytes(SENT_BR_STR), size_in_bytes(PARA_BR_STR))),
        TextUnit::Chars => Ok((SENT_BR_STR.chars().count(), PARA_BR_STR.chars().count())),
        TextUnit::Words => Ok((0, 0)),
        TextUnit::Wordtoks => Ok((1, 1)),
        _ => Err(TextError::Unexpected(format!(
            "unsupported unit for seeking: {unit}"
        ))),
    }
}

/// Shared counting function over subword tokens.
pub type TokenCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// Count subword tokens in a string using the named encoding.
pub fn tiktoken_len(text: &str, encoding: &str) -> Result<usize> {
    let bpe = resolve_encoding(encoding)?;
    Ok(bpe.encode_ordinary(text).len())
}

/// Count subword tokens with the default `cl100k_base` encoding, using a
/// process-wide cached encoder.
pub fn default_tiktoken_len(text: &str) -> usize {
    DEFAULT_ENCODER.encode_ordinary(text).len()
}

/// Build a reusable subword token counter for the named encoding.
pub fn subword_counter(encoding: &str) -> Result<TokenCounter> {
    let bpe = Arc::new(resolve_encoding(encoding)?);
    Ok(Arc::new(move |segment: &str| {
        bpe.encode_ordinary(segment).len()
    }))
}

fn resolve_encoding(name: &str) -> Result<CoreBPE> {
    let target = if name.trim().is_empty() {
        "cl100k_base"
    } else {
        name.trim()
    };
    let attempt = match target {
        "cl100k_base" => cl100k_base(),
        "o200k_base" => o200k_base(),
        "p50k_base" => p50k_base(),
        "p50k_edit" => p50k_edit(),
        "r50k_base" | "gpt2" => r50k_base(),
        other => match get_bpe_from_model(other) {
            Ok(encoding) => Ok(encoding),
            Err(model_err) => {
                tracing::warn!(
                    encoding = other,
                    error = %model_err,
                    "Unknown encoding; falling back to 'cl100k_base'"
                );
                cl100k_base()
            }
        },
    };
    attempt.map_err(|source| TextError::Tokenizer {
        encoding: target.to_string(),
        source,
    })
}
