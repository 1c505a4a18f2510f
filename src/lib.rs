#![deny(missing_docs)]

//! Core library for the textloom text transformation toolkit.
//!
//! textloom applies expensive, content-changing transforms (typically LLM
//! calls) to documents far larger than any single call can handle: it
//! tokenizes text into word tokens, generates sliding windows, diffs and
//! filters each window's transform output, and stitches the results back
//! together by minimum-edit-distance alignment. Token mappings let
//! annotations such as timestamps be transplanted from a source document
//! into its transformed derivatives.

/// Environment-driven configuration management.
pub mod config;
/// Token diffs, filters, alignment search, and token mappings.
pub mod diff;
/// Document model: paragraphs, sentences, sizes, sentence splitting.
pub mod doc;
/// Error kinds shared across the toolkit.
pub mod error;
/// Structured logging and tracing setup.
pub mod logging;
/// Stable Markdown normalization.
pub mod markdown;
/// Timestamp extraction and citation backfill.
pub mod provenance;
/// Word-token model and lossless tokenizer.
pub mod tokens;
/// Sliding windows and the filtered transform driver.
pub mod windows;
