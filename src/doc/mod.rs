//! Document model: paragraphs, sentences, sizes, and sentence splitting.

pub mod sentences;
pub mod sizes;
mod text_doc;

pub use sentences::{RegexSentenceSplitter, SENTENCE_MIN_LENGTH, SentenceSplitter};
pub use sizes::{TextUnit, TokenCounter, size, subword_counter, tiktoken_len};
pub use text_doc::{Paragraph, SentIndex, Sentence, SentenceMapping, TextDoc, WordtokMapping};
