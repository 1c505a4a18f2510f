//! Word-token ("wordtok") model: lossless text to token-sequence conversion.
//!
//! Text is treated as an ordered sequence of word, whitespace, punctuation,
//! and HTML-tag tokens, plus reserved structural markers for sentence
//! breaks, paragraph breaks, and beginning/end of file. Joining the string
//! forms of a token sequence reproduces the input exactly, modulo
//! whitespace normalization (any whitespace run becomes a single space).

pub mod search;

pub use search::{TokenSearcher, one_of, search_tokens};

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Literal form of the sentence-break marker. Lexes like an HTML tag.
pub const SENT_BR_TOK: &str = "<-SENT-BR->";
/// Literal form of the paragraph-break marker. Lexes like an HTML tag.
pub const PARA_BR_TOK: &str = "<-PARA-BR->";
/// Literal form of the beginning-of-file marker.
pub const BOF_TOK: &str = "<-BOF->";
/// Literal form of the end-of-file marker.
pub const EOF_TOK: &str = "<-EOF->";

/// Rendered form of a sentence break.
pub const SENT_BR_STR: &str = " ";
/// Rendered form of a paragraph break.
pub const PARA_BR_STR: &str = "\n\n";

/// Separator used when visualizing token sequences for debugging.
pub const SYMBOL_SEP: &str = "⎪";

// Words, single punctuation characters, whitespace runs, and HTML tags
// (length < 1024, possibly with embedded newlines) each lex as one token.
static WORDTOK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^<>]{0,1024}>|\w+|[^\w\s]|\s+").expect("valid regex"));

static PARA_BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\n\n\s*").expect("valid regex"));

static WORD_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A\w").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// One token in a document's lossless token sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Wordtok {
    /// A maximal run of Unicode word characters.
    Word(String),
    /// A single non-word, non-space character.
    Punct(char),
    /// A run of whitespace, collapsed to a single space.
    Space,
    /// An HTML tag, including attributes, with inner whitespace collapsed.
    Tag(String),
    /// Sentence-break marker; renders as a single space.
    SentBreak,
    /// Paragraph-break marker; renders as a blank line.
    ParaBreak,
    /// Beginning-of-file marker; renders as the empty string.
    Bof,
    /// End-of-file marker; renders as the empty string.
    Eof,
}

impl Wordtok {
    /// The token's literal form, with markers shown as their reserved
    /// tag-like literals (`<-SENT-BR->` etc.).
    pub fn token_str(&self) -> Cow<'_, str> {
        match self {
            Wordtok::Word(text) | Wordtok::Tag(text) => Cow::Borrowed(text),
            Wordtok::Punct(c) => Cow::Owned(c.to_string()),
            Wordtok::Space => Cow::Borrowed(SENT_BR_STR),
            Wordtok::SentBreak => Cow::Borrowed(SENT_BR_TOK),
            Wordtok::ParaBreak => Cow::Borrowed(PARA_BR_TOK),
            Wordtok::Bof => Cow::Borrowed(BOF_TOK),
            Wordtok::Eof => Cow::Borrowed(EOF_TOK),
        }
    }

    /// The token's rendered text form: markers render as their break
    /// strings (or nothing for BOF/EOF), everything else as itself.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Wordtok::SentBreak => Cow::Borrowed(SENT_BR_STR),
            Wordtok::ParaBreak => Cow::Borrowed(PARA_BR_STR),
            Wordtok::Bof | Wordtok::Eof => Cow::Borrowed(""),
            other => other.token_str(),
        }
    }

    /// Char length of the rendered form, so character offsets can be
    /// reconstructed from a token sequence.
    pub fn char_len(&self) -> usize {
        self.as_text().chars().count()
    }

    /// Is this token a word (not punctuation, whitespace, or a tag)?
    pub fn is_word(&self) -> bool {
        matches!(self, Wordtok::Word(_))
    }

    /// Is this token an HTML tag? Markers count: their literals lex as tags.
    pub fn is_tag(&self) -> bool {
        matches!(
            self,
            Wordtok::Tag(_)
                | Wordtok::SentBreak
                | Wordtok::ParaBreak
                | Wordtok::Bof
                | Wordtok::Eof
        )
    }

    /// Is this token an opening HTML tag, optionally restricted to the
    /// given tag names?
    pub fn is_tag_open(&self, tag_names: Option<&[&str]>) -> bool {
        let Wordtok::Tag(text) = self else {
            return false;
        };
        if text.starts_with("</") {
            return false;
        }
        match tag_names {
            None => true,
            Some(names) => names.iter().any(|name| tag_has_name(text, 1, name)),
        }
    }

    /// Is this token a closing HTML tag, optionally restricted to the
    /// given tag names?
    pub fn is_tag_close(&self, tag_names: Option<&[&str]>) -> bool {
        let Wordtok::Tag(text) = self else {
            return false;
        };
        if !text.starts_with("</") {
            return false;
        }
        match tag_names {
            None => true,
            Some(names) => names.iter().any(|name| tag_has_name(text, 2, name)),
        }
    }

    /// Any kind of paragraph break, sentence break, or whitespace.
    pub fn is_break_or_space(&self) -> bool {
        matches!(
            self,
            Wordtok::Space | Wordtok::SentBreak | Wordtok::ParaBreak
        )
    }
}

impl fmt::Display for Wordtok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token_str())
    }
}

fn tag_has_name(tag_text: &str, name_start: usize, name: &str) -> bool {
    tag_text[name_start..]
        .strip_prefix(name)
        .is_some_and(|rest| rest.starts_with(['>', ' ', '/', '\t', '\n']))
}

fn classify(raw: &str) -> Wordtok {
    if raw.chars().all(char::is_whitespace) {
        return Wordtok::Space;
    }
    if raw.len() >= 2 && raw.starts_with('<') && raw.ends_with('>') {
        let normalized = WHITESPACE_RE.replace_all(raw, " ");
        return match normalized.as_ref() {
            SENT_BR_TOK => Wordtok::SentBreak,
            PARA_BR_TOK => Wordtok::ParaBreak,
            BOF_TOK => Wordtok::Bof,
            EOF_TOK => Wordtok::Eof,
            _ => Wordtok::Tag(normalized.into_owned()),
        };
    }
    if WORD_START_RE.is_match(raw) {
        Wordtok::Word(raw.to_string())
    } else {
        // The lexer only produces single-character non-word matches here.
        Wordtok::Punct(raw.chars().next().expect("non-empty match"))
    }
}

/// Convert text to wordtoks, optionally bookended with BOF/EOF markers.
///
/// Does not detect paragraph or sentence breaks; all whitespace runs are
/// normalized to a single space token. Marker literals appearing in the
/// input lex back to their marker tokens, so re-tokenizing joined output
/// is stable.
pub fn tokenize(text: &str, bof_eof: bool) -> Vec<Wordtok> {
    let (wordtoks, _offsets) = tokenize_with_offsets(text, bof_eof);
    wordtoks
}

/// Same as [`tokenize`], but also returns each token's starting char
/// offset in the input text. With BOF/EOF, the markers sit at offset 0
/// and the total char length respectively.
pub fn tokenize_with_offsets(text: &str, bof_eof: bool) -> (Vec<Wordtok>, Vec<usize>) {
    let mut wordtoks = Vec::new();
    let mut offsets = Vec::new();
    let mut char_offset = 0;
    if bof_eof {
        wordtoks.push(Wordtok::Bof);
        offsets.push(0);
    }
    // Matches tile the input, so char offsets accumulate from zero.
    for mat in WORDTOK_RE.find_iter(text) {
        wordtoks.push(classify(mat.as_str()));
        offsets.push(char_offset);
        char_offset += mat.as_str().chars().count();
    }
    if bof_eof {
        wordtoks.push(Wordtok::Eof);
        offsets.push(char_offset);
    }
    (wordtoks, offsets)
}

/// Join wordtoks back into text using each token's rendered form.
pub fn join_wordtoks<'a>(wordtoks: impl IntoIterator<Item = &'a Wordtok>) -> String {
    wordtoks.into_iter().map(|tok| tok.as_text()).collect()
}

/// Replace each paragraph break (`\s*\n\n\s*`) in text with the
/// paragraph-break marker literal.
pub fn insert_para_markers(text: &str) -> String {
    PARA_BR_RE.replace_all(text, PARA_BR_TOK).into_owned()
}

/// True iff the first token of the text is an HTML tag containing `<div`.
/// Inspects at most the leading 100 chars.
pub fn first_wordtok_is_div(text: &str) -> bool {
    let head_end = text
        .char_indices()
        .nth(100)
        .map_or(text.len(), |(idx, _)| idx);
    let mut wordtoks = tokenize(&text[..head_end], false);
    // Drop any token cut off at the scan boundary.
    wordtoks.pop();
    match wordtoks.first() {
        Some(Wordtok::Tag(tag)) => tag.contains("<div"),
        _ => false,
    }
}

/// Render a token sequence with visible separators, for debugging.
pub fn visualize_wordtoks(wordtoks: &[Wordtok]) -> String {
    let mut out = String::from(SYMBOL_SEP);
    for tok in wordtoks {
        out.push_str(&tok.token_str());
        out.push_str(SYMBOL_SEP);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTENCE_TESTS: [&str; 4] = [
        "Hello, world!",
        "This is an example sentence with punctuation.",
        "And here's another one!",
        "Special characters: @#%^&*()",
    ];

    const SENTENCE_TEST_HTML: &str = "This is <span data-timestamp=\"1.234\">a test</span>.";

    #[test]
    fn tokenize_roundtrips_plain_sentences() {
        for sentence in SENTENCE_TESTS {
            let wordtoks = tokenize(sentence, false);
            assert_eq!(join_wordtoks(&wordtoks), sentence);
        }
    }

    #[test]
    fn tokenize_normalizes_whitespace_runs() {
        let wordtoks = tokenize("Multiple     spaces and tabs\tand\nnewlines in between.", false);
        let expected = [
            "Multiple", " ", "spaces", " ", "and", " ", "tabs", " ", "and", " ", "newlines", " ",
            "in", " ", "between", ".",
        ];
        let strs: Vec<String> = wordtoks.iter().map(|t| t.token_str().into_owned()).collect();
        assert_eq!(strs, expected);
    }

    #[test]
    fn tokenize_handles_empty_and_blank_input() {
        assert!(tokenize("", false).is_empty());
        assert_eq!(tokenize("   ", false), vec![Wordtok::Space]);
    }

    #[test]
    fn tokenize_treats_html_tags_as_single_tokens() {
        let wordtoks = tokenize(SENTENCE_TEST_HTML, false);
        let strs: Vec<String> = wordtoks.iter().map(|t| t.token_str().into_owned()).collect();
        assert_eq!(
            strs,
            vec![
                "This",
                " ",
                "is",
                " ",
                "<span data-timestamp=\"1.234\">",
                "a",
                " ",
                "test",
                "</span>",
                ".",
            ]
        );
        assert_eq!(join_wordtoks(&wordtoks), SENTENCE_TEST_HTML);
    }

    #[test]
    fn char_lengths_sum_to_input_length() {
        let total: usize = tokenize(SENTENCE_TEST_HTML, false)
            .iter()
            .map(Wordtok::char_len)
            .sum();
        assert_eq!(total, SENTENCE_TEST_HTML.chars().count());
    }

    #[test]
    fn marker_literals_lex_to_marker_tokens() {
        let text = format!("one{PARA_BR_TOK}two{SENT_BR_TOK}three");
        let wordtoks = tokenize(&text, false);
        assert_eq!(
            wordtoks,
            vec![
                Wordtok::Word("one".into()),
                Wordtok::ParaBreak,
                Wordtok::Word("two".into()),
                Wordtok::SentBreak,
                Wordtok::Word("three".into()),
            ]
        );
        // Re-tokenizing the literal forms is idempotent.
        let relexed = tokenize(
            &wordtoks.iter().map(|t| t.token_str()).collect::<String>(),
            false,
        );
        assert_eq!(relexed, wordtoks);
    }

    #[test]
    fn bof_eof_bookend_the_sequence_with_offsets() {
        let (wordtoks, offsets) = tokenize_with_offsets("Hi there.", true);
        assert_eq!(wordtoks.first(), Some(&Wordtok::Bof));
        assert_eq!(wordtoks.last(), Some(&Wordtok::Eof));
        assert_eq!(offsets.first(), Some(&0));
        assert_eq!(offsets.last(), Some(&9));
        assert_eq!(offsets[1..=2], [0, 2]);
    }

    #[test]
    fn insert_para_markers_replaces_blank_lines() {
        let text = "First para.\n\n  Second para.\nStill second.";
        assert_eq!(
            insert_para_markers(text),
            format!("First para.{PARA_BR_TOK}Second para.\nStill second.")
        );
    }

    #[test]
    fn classification_predicates() {
        let wordtoks = tokenize(SENTENCE_TEST_HTML, false);
        let tags: Vec<bool> = wordtoks.iter().map(Wordtok::is_tag).collect();
        assert_eq!(
            tags,
            vec![false, false, false, false, true, false, false, false, true, false]
        );
        let breaks: Vec<bool> = wordtoks.iter().map(Wordtok::is_break_or_space).collect();
        assert_eq!(
            breaks,
            vec![false, true, false, true, false, false, true, false, false, false]
        );
        assert!(Wordtok::SentBreak.is_tag());
        assert!(!Wordtok::SentBreak.is_tag_open(None));
    }

    #[test]
    fn tag_open_close_predicates_respect_names() {
        let open = Wordtok::Tag("<h2 class=\"x\">".into());
        let close = Wordtok::Tag("</h2>".into());
        let headers = ["h1", "h2", "h3", "h4", "h5", "h6"];
        assert!(open.is_tag_open(Some(&headers)));
        assert!(!open.is_tag_close(Some(&headers)));
        assert!(close.is_tag_close(Some(&headers)));
        assert!(!close.is_tag_open(Some(&headers)));
        // "h2" must not match a tag named "h20".
        let h20 = Wordtok::Tag("<h20>".into());
        assert!(!h20.is_tag_open(Some(&headers)));
    }

    #[test]
    fn first_wordtok_is_div_scans_leading_tokens_only() {
        assert!(first_wordtok_is_div("<div class=\"chunk\">Some text.</div> trailing"));
        assert!(!first_wordtok_is_div("Some text before <div>a div</div>"));
        assert!(!first_wordtok_is_div("<span>not a div</span> and more"));
        assert!(!first_wordtok_is_div(""));
    }

    #[test]
    fn tags_collapse_embedded_whitespace() {
        let text = "<span class=\"citation\"\n    data-timestamp=\"10.29\">00:10</span>";
        let wordtoks = tokenize(text, false);
        assert_eq!(
            wordtoks[0],
            Wordtok::Tag("<span class=\"citation\" data-timestamp=\"10.29\">".into())
        );
    }

    #[test]
    fn visualize_uses_separators() {
        let wordtoks = tokenize("a b", false);
        assert_eq!(visualize_wordtoks(&wordtoks), "⎪a⎪ ⎪b⎪");
    }
}
