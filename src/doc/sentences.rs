//! Sentence splitting.
//!
//! The built-in splitter is a fast, conservative regex heuristic tuned for
//! English prose: a sentence ends on a word of at least two letters whose
//! last letter is lowercase, followed by `.`, `!`, or `?`, optionally with
//! an adjacent closing quote or parenthesis. Very short candidate
//! sentences are not split off. Higher-fidelity NLP splitters can be
//! plugged in through the [`SentenceSplitter`] trait.

use std::sync::LazyLock;

use regex::Regex;

/// Splits a paragraph of text into sentences.
pub trait SentenceSplitter {
    /// Split text into sentence strings. Whitespace runs inside a
    /// sentence are normalized to single spaces.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Default minimum sentence length in characters. Splits producing a
/// shorter sentence are suppressed to avoid over-splitting.
pub const SENTENCE_MIN_LENGTH: usize = 15;

// End of sentence: two or more letters ending lowercase, then .!? with an
// optional closing quote or paren on either side of the punctuation.
// Colons and semicolons are excluded; they false-positive on code.
static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\b\p{L}+\p{Ll})([.?!]['"’”)]?|['"’”)][.?!]) *$"#).expect("valid regex")
});

/// True if the word looks like the end of a sentence.
pub fn heuristic_end_of_sentence(word: &str) -> bool {
    SENTENCE_END_RE.is_match(word)
}

/// Fast regex-based sentence splitter.
#[derive(Debug, Clone, Copy)]
pub struct RegexSentenceSplitter {
    /// Minimum sentence length in characters.
    pub min_length: usize,
}

impl RegexSentenceSplitter {
    /// Build a splitter with the given minimum sentence length.
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Default for RegexSentenceSplitter {
    fn default() -> Self {
        Self::new(SENTENCE_MIN_LENGTH)
    }
}

impl SentenceSplitter for RegexSentenceSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut sentence: Vec<&str> = Vec::new();
        let mut words_len = 0;
        for word in text.split_whitespace() {
            sentence.push(word);
            words_len += word.chars().count();
            let sentence_len = words_len + sentence.len() - 1;
            if heuristic_end_of_sentence(word) && sentence_len >= self.min_length {
                sentences.push(sentence.join(" "));
                sentence.clear();
                words_len = 0;
            }
        }
        if !sentence.is_empty() {
            sentences.push(sentence.join(" "));
        }
        sentences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> Vec<String> {
        RegexSentenceSplitter::default().split(text)
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split("This is the first sentence. And here is the second one!");
        assert_eq!(
            sentences,
            vec![
                "This is the first sentence.",
                "And here is the second one!",
            ]
        );
    }

    #[test]
    fn short_candidates_are_not_split_off() {
        // "Hello World." is under the minimum length, so no break happens.
        let sentences = split("Hello World. This is an example sentence.");
        assert_eq!(sentences, vec!["Hello World. This is an example sentence."]);
    }

    #[test]
    fn numerals_and_capitals_do_not_end_sentences() {
        let sentences = split("Sentence 1a. Sentence 1b. Sentence 1c.");
        assert_eq!(sentences, vec!["Sentence 1a. Sentence 1b. Sentence 1c."]);
        let shouting = split("IS THIS THE END? MAYBE NOT.");
        assert_eq!(shouting, vec!["IS THIS THE END? MAYBE NOT."]);
    }

    #[test]
    fn closing_quotes_are_part_of_the_sentence_end() {
        let sentences = split("\"It was a long day.\" Then everyone went home quietly.");
        assert_eq!(
            sentences,
            vec![
                "\"It was a long day.\"",
                "Then everyone went home quietly.",
            ]
        );
    }

    #[test]
    fn interior_newlines_collapse_to_spaces() {
        let sentences = split("A line that continues\nonto the next line. And then some.");
        assert_eq!(
            sentences,
            vec![
                "A line that continues onto the next line.",
                "And then some.",
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_sentences() {
        assert!(split("").is_empty());
        assert!(split("   \n  ").is_empty());
    }
}
