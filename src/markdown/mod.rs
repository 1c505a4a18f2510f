//! Stable Markdown normalization.
//!
//! Reformats Markdown so repeated transforms converge: sentences go on
//! their own lines wrapped at a fixed width, list items are always
//! separated by blank lines (so each item reads as a paragraph in plain
//! text), and HTML comments become standalone paragraphs. Inline and
//! block HTML pass through untouched. The output is idempotent under
//! re-normalization.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;
use textwrap::{WordSplitter, fill};

use crate::doc::{RegexSentenceSplitter, SentenceSplitter};

/// Default wrap width for normalized text content.
pub const DEFAULT_WRAP_WIDTH: usize = 92;

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\s*<!--.*?-->\s*").expect("valid regex"));

/// How paragraph text is broken into lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineWrapping {
    /// Keep sentences on their own lines, wrapping each to the width.
    BySentence,
    /// Plain filling to the width.
    ByWidth,
}

/// Normalize Markdown text with sentence-per-line wrapping at the
/// default width.
pub fn normalize_markdown(text: &str) -> String {
    normalize_markdown_with(text, DEFAULT_WRAP_WIDTH, LineWrapping::BySentence)
}

/// Normalize and wrap Markdown for plain reading, without sentence
/// breaking.
pub fn wrap_markdown(text: &str, width: usize) -> String {
    normalize_markdown_with(text, width, LineWrapping::ByWidth)
}

/// Normalize Markdown with explicit width and wrapping strategy.
pub fn normalize_markdown_with(text: &str, width: usize, wrapping: LineWrapping) -> String {
    let prepared = isolate_html_comments(text.trim());
    let events: Vec<Event<'_>> = Parser::new_ext(&prepared, Options::empty()).collect();
    let mut renderer = Normalizer {
        events,
        pos: 0,
        width,
        wrapping,
    };
    let blocks = renderer.render_blocks("", "", None);
    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

/// Put each HTML comment in its own paragraph.
fn isolate_html_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for mat in COMMENT_RE.find_iter(text) {
        out.push_str(&text[last..mat.start()]);
        if mat.start() != 0 {
            out.push_str("\n\n");
        }
        out.push_str(mat.as_str().trim());
        if mat.end() != text.len() {
            out.push_str("\n\n");
        }
        last = mat.end();
    }
    out.push_str(&text[last..]);
    out
}

struct Normalizer<'a> {
    events: Vec<Event<'a>>,
    pos: usize,
    width: usize,
    wrapping: LineWrapping,
}

impl Normalizer<'_> {
    /// Render blocks until the matching end tag (or end of input),
    /// using `first_prefix` on the first emitted block and `rest_prefix`
    /// on the rest. Returns one string per block; the caller separates
    /// them with blank lines.
    fn render_blocks(
        &mut self,
        first_prefix: &str,
        rest_prefix: &str,
        until: Option<TagEnd>,
    ) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut prefix = first_prefix.to_string();

        while self.pos < self.events.len() {
            let event = self.events[self.pos].clone();
            self.pos += 1;
            match event {
                Event::End(end) if Some(end) == until => break,
                Event::Start(Tag::Paragraph) => {
                    let inline = self.render_inline(TagEnd::Paragraph);
                    blocks.push(self.wrap_block(&inline, &prefix, rest_prefix));
                    prefix = rest_prefix.to_string();
                }
                Event::Start(Tag::Heading { level, .. }) => {
                    let inline = self.render_inline(TagEnd::Heading(level));
                    let hashes = "#".repeat(heading_depth(level));
                    blocks.push(format!("{prefix}{hashes} {inline}"));
                    prefix = rest_prefix.to_string();
                }
                Event::Start(Tag::List(start)) => {
                    let items = self.render_list(start, &prefix, rest_prefix);
                    blocks.extend(items);
                    prefix = rest_prefix.to_string();
                }
                Event::Start(tag @ Tag::BlockQuote(_)) => {
                    let inner = self.render_blocks("", "", Some(tag.to_end()));
                    let quoted = inner
                        .join("\n\n")
                        .lines()
                        .map(|line| {
                            if line.is_empty() {
                                format!("{prefix}>")
                            } else {
                                format!("{prefix}> {line}")
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                    blocks.push(quoted);
                    prefix = rest_prefix.to_string();
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let body = self.collect_code(TagEnd::CodeBlock);
                    blocks.push(render_code_block(&kind, &body, &prefix, rest_prefix));
                    prefix = rest_prefix.to_string();
                }
                Event::Start(Tag::HtmlBlock) => {
                    let body = self.collect_code(TagEnd::HtmlBlock);
                    blocks.push(format!("{prefix}{}", body.trim_end()));
                    prefix = rest_prefix.to_string();
                }
                Event::Rule => {
                    blocks.push(format!("{prefix}* * *"));
                    prefix = rest_prefix.to_string();
                }
                Event::Html(html) | Event::Text(html) => {
                    // Stray block-position content passes through.
                    let trimmed = html.trim_end();
                    if !trimmed.is_empty() {
                        blocks.push(format!("{prefix}{trimmed}"));
                        prefix = rest_prefix.to_string();
                    }
                }
                Event::Start(other) => {
                    // Unhandled container: render its inline content.
                    let inline = self.render_inline(other.to_end());
                    if !inline.trim().is_empty() {
                        blocks.push(self.wrap_block(&inline, &prefix, rest_prefix));
                        prefix = rest_prefix.to_string();
                    }
                }
                _ => {}
            }
        }
        blocks
    }

    fn render_list(
        &mut self,
        start: Option<u64>,
        first_prefix: &str,
        rest_prefix: &str,
    ) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut number = start;
        let mut prefix = first_prefix.to_string();

        while self.pos < self.events.len() {
            let event = self.events[self.pos].clone();
            self.pos += 1;
            match event {
                Event::End(TagEnd::List(_)) => break,
                Event::Start(Tag::Item) => {
                    let marker = match number {
                        Some(n) => {
                            number = Some(n + 1);
                            format!("{n}. ")
                        }
                        None => "- ".to_string(),
                    };
                    let item_first = format!("{prefix}{marker}");
                    let item_rest = format!("{rest_prefix}{}", " ".repeat(marker.len()));
                    let item_blocks =
                        self.render_item(&item_first, &item_rest, TagEnd::Item);
                    blocks.extend(item_blocks);
                    prefix = rest_prefix.to_string();
                }
                _ => {}
            }
        }
        blocks
    }

    /// Render one list item. Tight items carry bare inline content with
    /// no paragraph wrapper; gather it into a paragraph of its own.
    fn render_item(
        &mut self,
        first_prefix: &str,
        rest_prefix: &str,
        until: TagEnd,
    ) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut prefix = first_prefix.to_string();
        let mut inline = String::new();

        while self.pos < self.events.len() {
            let event = self.events[self.pos].clone();
            if is_inline_event(&event) {
                self.pos += 1;
                self.append_inline(&mut inline, event);
                continue;
            }
            if !inline.trim().is_empty() {
                blocks.push(self.wrap_block(&inline, &prefix, rest_prefix));
                prefix = rest_prefix.to_string();
                inline.clear();
            }
            match event {
                Event::End(end) if end == until => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    let inner = self.render_blocks(&prefix, rest_prefix, Some(until));
                    blocks.extend(inner);
                    prefix = rest_prefix.to_string();
                    break;
                }
            }
        }
        if !inline.trim().is_empty() {
            blocks.push(self.wrap_block(&inline, &prefix, rest_prefix));
        }
        blocks
    }

    fn render_inline(&mut self, until: TagEnd) -> String {
        let mut out = String::new();
        while self.pos < self.events.len() {
            let event = self.events[self.pos].clone();
            self.pos += 1;
            match event {
                Event::End(end) if end == until => break,
                other => self.append_inline(&mut out, other),
            }
        }
        out
    }

    fn append_inline(&mut self, out: &mut String, event: Event<'_>) {
        match event {
            Event::Text(text) => out.push_str(&text),
            Event::Code(code) => out.push_str(&render_code_span(&code)),
            Event::InlineHtml(html) | Event::Html(html) => out.push_str(&html),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::Start(Tag::Emphasis) => {
                let inner = self.render_inline(TagEnd::Emphasis);
                out.push_str(&format!("*{inner}*"));
            }
            Event::Start(Tag::Strong) => {
                let inner = self.render_inline(TagEnd::Strong);
                out.push_str(&format!("**{inner}**"));
            }
            Event::Start(Tag::Strikethrough) => {
                let inner = self.render_inline(TagEnd::Strikethrough);
                out.push_str(&format!("~~{inner}~~"));
            }
            Event::Start(Tag::Link { dest_url, title, .. }) => {
                let inner = self.render_inline(TagEnd::Link);
                if title.is_empty() {
                    out.push_str(&format!("[{inner}]({dest_url})"));
                } else {
                    out.push_str(&format!("[{inner}]({dest_url} \"{title}\")"));
                }
            }
            Event::Start(Tag::Image { dest_url, title, .. }) => {
                let inner = self.render_inline(TagEnd::Image);
                if title.is_empty() {
                    out.push_str(&format!("![{inner}]({dest_url})"));
                } else {
                    out.push_str(&format!("![{inner}]({dest_url} \"{title}\")"));
                }
            }
            Event::Start(other) => {
                let inner = self.render_inline(other.to_end());
                out.push_str(&inner);
            }
            _ => {}
        }
    }

    fn collect_code(&mut self, until: TagEnd) -> String {
        let mut out = String::new();
        while self.pos < self.events.len() {
            let event = self.events[self.pos].clone();
            self.pos += 1;
            match event {
                Event::End(end) if end == until => break,
                Event::Text(text) | Event::Html(text) => out.push_str(&text),
                _ => {}
            }
        }
        out
    }

    /// Wrap paragraph text to the width, optionally keeping sentences on
    /// their own lines. Long words are never broken.
    fn wrap_block(&self, text: &str, first_prefix: &str, rest_prefix: &str) -> String {
        let cont_indent = " ".repeat(first_prefix.len().max(rest_prefix.len()));
        let cont_indent = if first_prefix.is_empty() {
            String::new()
        } else {
            cont_indent
        };
        match self.wrapping {
            LineWrapping::ByWidth => {
                fill_with(text, self.width, first_prefix, &cont_indent)
            }
            LineWrapping::BySentence => {
                let sentences = RegexSentenceSplitter::default().split(text);
                let mut lines = Vec::new();
                for (i, sentence) in sentences.iter().enumerate() {
                    let initial = if i == 0 { first_prefix } else { &cont_indent };
                    lines.push(fill_with(sentence, self.width, initial, &cont_indent));
                }
                lines.join("\n")
            }
        }
    }
}

fn fill_with(text: &str, width: usize, initial: &str, subsequent: &str) -> String {
    let options = textwrap::Options::new(width)
        .initial_indent(initial)
        .subsequent_indent(subsequent)
        .break_words(false)
        .word_splitter(WordSplitter::NoHyphenation);
    fill(text, options)
}

fn render_code_block(
    kind: &CodeBlockKind<'_>,
    body: &str,
    prefix: &str,
    rest_prefix: &str,
) -> String {
    let lang = match kind {
        CodeBlockKind::Fenced(lang) => lang.as_ref(),
        CodeBlockKind::Indented => "",
    };
    let mut lines = vec![format!("{prefix}```{lang}")];
    for line in body.trim_end_matches('\n').lines() {
        lines.push(format!("{rest_prefix}{line}"));
    }
    lines.push(format!("{rest_prefix}```"));
    lines.join("\n")
}

fn render_code_span(code: &str) -> String {
    if code.starts_with('`') || code.ends_with('`') {
        format!("`` {code} ``")
    } else {
        format!("`{code}`")
    }
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn is_inline_event(event: &Event<'_>) -> bool {
    matches!(
        event,
        Event::Text(_)
            | Event::Code(_)
            | Event::InlineHtml(_)
            | Event::SoftBreak
            | Event::HardBreak
            | Event::Start(
                Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
            )
            | Event::End(
                TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link | TagEnd::Image
            )
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_become_standalone_paragraphs() {
        let input = "<!--window-br--> Words and words";
        assert_eq!(
            isolate_html_comments(input),
            "<!--window-br-->\n\nWords and words"
        );
        let normalized = normalize_markdown(input);
        assert_eq!(normalized, "<!--window-br-->\n\nWords and words\n");
    }

    #[test]
    fn sentences_go_on_their_own_lines() {
        let input = "This is sentence one. This is sentence two.\nThis is sentence three.";
        let normalized = normalize_markdown(input);
        assert_eq!(
            normalized,
            "This is sentence one.\nThis is sentence two.\nThis is sentence three.\n"
        );
    }

    #[test]
    fn long_sentences_wrap_without_breaking_words() {
        let word = "a-very-long-hyphenated-word-that-should-never-be-broken-across-lines-anywhere";
        let input = format!("Here is a long sentence that mentions {word} near its end.");
        let normalized = normalize_markdown(&input);
        assert!(normalized.lines().any(|line| line.contains(word)));
        for line in normalized.lines() {
            assert!(line.len() <= DEFAULT_WRAP_WIDTH || line.contains(word));
        }
    }

    #[test]
    fn list_items_are_separated_by_blank_lines() {
        let input = "- This is a list item\n- This is another list item\n- And a third one here";
        let normalized = normalize_markdown(input);
        assert_eq!(
            normalized,
            "- This is a list item\n\n- This is another list item\n\n- And a third one here\n"
        );
    }

    #[test]
    fn nested_lists_indent_under_their_parents() {
        let input = "- This is a list item\n    - A sub item\n- Another top item";
        let normalized = normalize_markdown(input);
        assert_eq!(
            normalized,
            "- This is a list item\n\n  - A sub item\n\n- Another top item\n"
        );
    }

    #[test]
    fn ordered_lists_keep_their_numbering() {
        let input = "1. This is a numbered list item\n2. This is another numbered list item";
        let normalized = normalize_markdown(input);
        assert_eq!(
            normalized,
            "1. This is a numbered list item\n\n2. This is another numbered list item\n"
        );
    }

    #[test]
    fn headings_quotes_and_rules_round_trip() {
        let input = "# A Header\n\nSome text under the header goes here.\n\n\
                     > This is a quote block. With a couple sentences.\n\n---";
        let normalized = normalize_markdown(input);
        assert!(normalized.starts_with("# A Header\n\n"));
        assert!(normalized.contains("> This is a quote block.\n> With a couple sentences."));
        assert!(normalized.contains("* * *"));
    }

    #[test]
    fn inline_markup_is_preserved() {
        let input =
            "A [link](https://example.com) plus some *emphasis* and **strong emphasis** and `code` here.";
        let normalized = normalize_markdown(input);
        assert!(normalized.contains("[link](https://example.com)"));
        assert!(normalized.contains("*emphasis*"));
        assert!(normalized.contains("**strong emphasis**"));
        assert!(normalized.contains("`code`"));
    }

    #[test]
    fn inline_html_passes_through() {
        let input = "Before the span. <span data-foo=\"bar\">Inline HTML stays put.</span> After it all.";
        let normalized = normalize_markdown(input);
        assert!(normalized.contains("<span data-foo=\"bar\">Inline HTML stays put.</span>"));
    }

    #[test]
    fn fenced_code_blocks_keep_their_content() {
        let input = "Intro sentence for the code.\n\n```rust\nlet x = 1;\nlet y = 2;\n```";
        let normalized = normalize_markdown(input);
        assert!(normalized.contains("```rust\nlet x = 1;\nlet y = 2;\n```"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let input = "# Header\n\nFirst sentence of the paragraph. Second sentence of it.\n\n\
                     - item one with some words\n- item two with some words\n\n\
                     1. numbered item one here\n2. numbered item two here\n\n\
                     <!--window-br-->\n\nClosing words after the break marker.";
        let once = normalize_markdown(input);
        let twice = normalize_markdown(&once);
        assert_eq!(once, twice);
    }
}
