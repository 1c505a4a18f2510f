//! Documents as paragraphs of sentences, with size accounting and
//! token-level offset mappings.

use std::collections::BTreeMap;
use std::fmt;

use crate::doc::sentences::{RegexSentenceSplitter, SentenceSplitter};
use crate::doc::sizes::{self, TextUnit, break_sizes};
use crate::error::{Result, TextError};
use crate::tokens::{PARA_BR_STR, SENT_BR_STR, Wordtok, join_wordtoks, tokenize};

/// Symbol prefix for paragraph indices in debug output.
const SYMBOL_PARA: &str = "¶";
/// Symbol prefix for sentence indices in debug output.
const SYMBOL_SENT: &str = "§";

/// Position of a sentence within a [`TextDoc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SentIndex {
    /// Index of the owning paragraph.
    pub para_index: usize,
    /// Index of the sentence within the paragraph.
    pub sent_index: usize,
}

impl SentIndex {
    /// Build a sentence index.
    pub fn new(para_index: usize, sent_index: usize) -> Self {
        Self {
            para_index,
            sent_index,
        }
    }
}

impl fmt::Display for SentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SYMBOL_PARA}{},{SYMBOL_SENT}{}", self.para_index, self.sent_index)
    }
}

/// Mapping from wordtok index to the sentence containing it.
pub type WordtokMapping = BTreeMap<usize, SentIndex>;

/// Mapping from sentence index to the wordtok indices it spans.
pub type SentenceMapping = BTreeMap<SentIndex, Vec<usize>>;

/// One sentence and its char offset within the owning paragraph's
/// original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Sentence text.
    pub text: String,
    /// Char offset of the sentence in the paragraph's original text.
    pub char_offset: usize,
}

impl Sentence {
    /// Build a sentence at the given char offset.
    pub fn new(text: impl Into<String>, char_offset: usize) -> Self {
        Self {
            text: text.into(),
            char_offset,
        }
    }

    /// Measure the sentence in the given unit.
    pub fn size(&self, unit: TextUnit) -> usize {
        match unit {
            TextUnit::Bytes => self.text.len(),
            TextUnit::Chars => self.text.chars().count(),
            TextUnit::Words => sizes::html_to_plaintext(&self.text).split_whitespace().count(),
            TextUnit::Wordtoks => tokenize(&self.text, false).len(),
            TextUnit::Tiktokens => sizes::default_tiktoken_len(&self.text),
            TextUnit::Sentences | TextUnit::Paragraphs => 1,
        }
    }

    /// The sentence as wordtoks.
    pub fn as_wordtoks(&self) -> Vec<Wordtok> {
        tokenize(&self.text, false)
    }
}

/// One paragraph: the original block text, its sentences, and its char
/// offset within the document's original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// The paragraph block as it appeared in the source text.
    pub original_text: String,
    /// Sentences, in order.
    pub sentences: Vec<Sentence>,
    /// Char offset of the paragraph in the document's original text.
    pub char_offset: usize,
}

impl Paragraph {
    /// Parse a paragraph, splitting it into sentences.
    pub fn from_text(
        text: &str,
        char_offset: usize,
        splitter: &dyn SentenceSplitter,
    ) -> Self {
        let mut sent_offset = 0;
        let mut sentences = Vec::new();
        for sent_str in splitter.split(text) {
            let len = sent_str.chars().count();
            sentences.push(Sentence::new(sent_str, sent_offset));
            sent_offset += len + SENT_BR_STR.chars().count();
        }
        Self {
            original_text: text.to_string(),
            sentences,
            char_offset,
        }
    }

    /// Rejoin the sentences with single spaces.
    pub fn reassemble(&self) -> String {
        let texts: Vec<&str> = self.sentences.iter().map(|s| s.text.as_str()).collect();
        texts.join(SENT_BR_STR)
    }

    /// Replace all occurrences of a substring in every sentence.
    pub fn replace_str(&mut self, old: &str, new: &str) {
        for sent in &mut self.sentences {
            sent.text = sent.text.replace(old, new);
        }
    }

    /// Measure the paragraph in the given unit, counting inter-sentence
    /// breaks for units where a break occupies space.
    pub fn size(&self, unit: TextUnit) -> usize {
        match unit {
            TextUnit::Paragraphs => 1,
            TextUnit::Sentences => self.sentences.len(),
            TextUnit::Tiktokens => sizes::default_tiktoken_len(&self.reassemble()),
            _ => {
                let base: usize = self.sentences.iter().map(|s| s.size(unit)).sum();
                let nbreaks = self.sentences.len().saturating_sub(1);
                match unit {
                    TextUnit::Bytes => base + nbreaks * SENT_BR_STR.len(),
                    TextUnit::Chars => base + nbreaks * SENT_BR_STR.chars().count(),
                    TextUnit::Words => base,
                    TextUnit::Wordtoks => base + nbreaks,
                    _ => unreachable!("handled above"),
                }
            }
        }
    }

    /// The paragraph as wordtoks paired with the index of the sentence
    /// each token belongs to. Sentence-break markers are attributed to
    /// the preceding sentence.
    pub fn as_wordtok_to_sent(&self) -> Vec<(Wordtok, usize)> {
        let mut out = Vec::new();
        let last = self.sentences.len().saturating_sub(1);
        for (sent_index, sent) in self.sentences.iter().enumerate() {
            for tok in sent.as_wordtoks() {
                out.push((tok, sent_index));
            }
            if sent_index != last {
                out.push((Wordtok::SentBreak, sent_index));
            }
        }
        out
    }

    /// The paragraph as wordtoks, with sentence-break markers between
    /// sentences.
    pub fn as_wordtoks(&self) -> Vec<Wordtok> {
        self.as_wordtok_to_sent()
            .into_iter()
            .map(|(tok, _)| tok)
            .collect()
    }
}

/// A document as an ordered list of paragraphs separated by blank lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextDoc {
    /// Paragraphs, in order.
    pub paragraphs: Vec<Paragraph>,
}

impl TextDoc {
    /// Parse text with the default fast sentence splitter.
    pub fn from_text(text: &str) -> Self {
        Self::from_text_with(text, &RegexSentenceSplitter::default())
    }

    /// Parse text using the given sentence splitter. Trailing whitespace
    /// is trimmed, paragraphs split on blank lines, and empty blocks
    /// dropped.
    pub fn from_text_with(text: &str, splitter: &dyn SentenceSplitter) -> Self {
        let text = text.trim();
        let mut paragraphs = Vec::new();
        let mut char_offset = 0;
        for block in text.split(PARA_BR_STR) {
            let stripped = block.trim();
            if !stripped.is_empty() {
                paragraphs.push(Paragraph::from_text(stripped, char_offset, splitter));
            }
            char_offset += block.chars().count() + PARA_BR_STR.chars().count();
        }
        Self { paragraphs }
    }

    /// Rebuild a document from a wordtok sequence. Tokenization is
    /// lossless, so this is stable across repeated round trips.
    pub fn from_wordtoks(wordtoks: &[Wordtok]) -> Self {
        Self::from_text(&join_wordtoks(wordtoks))
    }

    /// Rejoin paragraphs with blank lines and sentences with spaces.
    pub fn reassemble(&self) -> String {
        let paras: Vec<String> = self.paragraphs.iter().map(Paragraph::reassemble).collect();
        paras.join(PARA_BR_STR)
    }

    /// Replace all occurrences of a substring throughout the document.
    pub fn replace_str(&mut self, old: &str, new: &str) {
        for para in &mut self.paragraphs {
            para.replace_str(old, new);
        }
    }

    /// Index of the first sentence.
    pub fn first_index(&self) -> SentIndex {
        SentIndex::new(0, 0)
    }

    /// Index of the last sentence.
    pub fn last_index(&self) -> SentIndex {
        let para_index = self.paragraphs.len().saturating_sub(1);
        let sent_index = self
            .paragraphs
            .last()
            .map_or(0, |p| p.sentences.len().saturating_sub(1));
        SentIndex::new(para_index, sent_index)
    }

    /// Iterate sentences in document order.
    pub fn sent_iter(&self) -> impl Iterator<Item = (SentIndex, &Sentence)> {
        self.paragraphs.iter().enumerate().flat_map(|(pi, para)| {
            para.sentences
                .iter()
                .enumerate()
                .map(move |(si, sent)| (SentIndex::new(pi, si), sent))
        })
    }

    /// Look up a sentence by index.
    pub fn get_sent(&self, index: SentIndex) -> Option<&Sentence> {
        self.paragraphs
            .get(index.para_index)
            .and_then(|p| p.sentences.get(index.sent_index))
    }

    /// Replace the text of a sentence, keeping its char offset.
    pub fn set_sent(&mut self, index: SentIndex, sent_str: impl Into<String>) -> Result<()> {
        let sent = self
            .paragraphs
            .get_mut(index.para_index)
            .and_then(|p| p.sentences.get_mut(index.sent_index))
            .ok_or_else(|| {
                TextError::InvalidInput(format!("sentence index out of range: {index}"))
            })?;
        sent.text = sent_str.into();
        Ok(())
    }

    /// Rewrite a sentence through a transform, keeping its char offset.
    pub fn update_sent(
        &mut self,
        index: SentIndex,
        transform: impl FnOnce(&str) -> String,
    ) -> Result<()> {
        let old = self
            .get_sent(index)
            .ok_or_else(|| {
                TextError::InvalidInput(format!("sentence index out of range: {index}"))
            })?
            .text
            .clone();
        self.set_sent(index, transform(&old))
    }

    /// Find the last sentence that starts at or before the given offset.
    /// Returns the sentence index and the offset of the sentence start in
    /// the same unit.
    pub fn seek_to_sent(&self, offset: usize, unit: TextUnit) -> Result<(SentIndex, usize)> {
        let (size_sent_break, size_para_break) = break_sizes(unit)?;
        let mut current_size = 0;
        let mut last_fit: Option<(SentIndex, usize)> = None;

        for (para_index, para) in self.paragraphs.iter().enumerate() {
            for (sent_index, sent) in para.sentences.iter().enumerate() {
                let sentence_size = sent.size(unit);
                let fit = (SentIndex::new(para_index, sent_index), current_size);
                if current_size + sentence_size + size_sent_break <= offset {
                    last_fit = Some(fit);
                    current_size += sentence_size;
                    if sent_index < para.sentences.len() - 1 {
                        current_size += size_sent_break;
                    }
                } else {
                    return Ok(fit);
                }
            }
            if para_index < self.paragraphs.len() - 1 {
                current_size += size_para_break;
            }
        }

        last_fit.ok_or_else(|| TextError::InvalidInput("cannot seek into empty document".into()))
    }

    /// Slice out an inclusive range of sentences, preserving original
    /// paragraph and sentence offsets. `None` for `last` means through the
    /// end of the document.
    pub fn sub_doc(&self, first: SentIndex, last: Option<SentIndex>) -> Result<TextDoc> {
        let last = last.unwrap_or_else(|| self.last_index());
        if last > self.last_index() {
            return Err(TextError::InvalidInput(format!(
                "end index out of range: {last} > {}",
                self.last_index()
            )));
        }

        let mut sub_paras = Vec::new();
        for i in first.para_index..=last.para_index {
            let para = &self.paragraphs[i];
            let start = if i == first.para_index { first.sent_index } else { 0 };
            let end = if i == last.para_index {
                last.sent_index + 1
            } else {
                para.sentences.len()
            };
            let start = start.min(para.sentences.len());
            let end = end.min(para.sentences.len()).max(start);
            sub_paras.push(Paragraph {
                original_text: para.original_text.clone(),
                sentences: para.sentences[start..end].to_vec(),
                char_offset: para.char_offset,
            });
        }
        Ok(TextDoc { paragraphs: sub_paras })
    }

    /// Slice out an inclusive range of whole paragraphs. `None` for `end`
    /// means through the last paragraph.
    pub fn sub_paras(&self, start: usize, end: Option<usize>) -> TextDoc {
        let end = end.unwrap_or(self.paragraphs.len().saturating_sub(1));
        let upper = (end + 1).min(self.paragraphs.len());
        TextDoc {
            paragraphs: self.paragraphs[start.min(upper)..upper].to_vec(),
        }
    }

    /// The sentence before the given one, crossing paragraph boundaries.
    pub fn prev_sent(&self, index: SentIndex) -> Result<SentIndex> {
        if index.sent_index > 0 {
            Ok(SentIndex::new(index.para_index, index.sent_index - 1))
        } else if index.para_index > 0 {
            let prev_para = &self.paragraphs[index.para_index - 1];
            Ok(SentIndex::new(
                index.para_index - 1,
                prev_para.sentences.len().saturating_sub(1),
            ))
        } else {
            Err(TextError::InvalidInput("no previous sentence".into()))
        }
    }

    /// Append a sentence to the last paragraph, creating one if empty.
    pub fn append_sent(&mut self, sent: Sentence) {
        match self.paragraphs.last_mut() {
            Some(last_para) => last_para.sentences.push(sent),
            None => self.paragraphs.push(Paragraph {
                original_text: sent.text.clone(),
                sentences: vec![sent],
                char_offset: 0,
            }),
        }
    }

    /// Measure the document in the given unit, counting inter-paragraph
    /// breaks for units where a break occupies space.
    pub fn size(&self, unit: TextUnit) -> usize {
        match unit {
            TextUnit::Paragraphs => self.paragraphs.len(),
            TextUnit::Sentences => self.paragraphs.iter().map(|p| p.sentences.len()).sum(),
            TextUnit::Tiktokens => sizes::default_tiktoken_len(&self.reassemble()),
            _ => {
                let base: usize = self.paragraphs.iter().map(|p| p.size(unit)).sum();
                let nbreaks = self.paragraphs.len().saturating_sub(1);
                match unit {
                    TextUnit::Bytes => base + nbreaks * PARA_BR_STR.len(),
                    TextUnit::Chars => base + nbreaks * PARA_BR_STR.chars().count(),
                    TextUnit::Words => base,
                    TextUnit::Wordtoks => base + nbreaks,
                    _ => unreachable!("handled above"),
                }
            }
        }
    }

    /// One-line size summary across the cheap units.
    pub fn size_summary(&self) -> String {
        format!(
            "{} bytes ({} paragraphs, {} sentences, {} words, {} wordtoks)",
            self.size(TextUnit::Bytes),
            self.size(TextUnit::Paragraphs),
            self.size(TextUnit::Sentences),
            self.size(TextUnit::Words),
            self.size(TextUnit::Wordtoks),
        )
    }

    /// The document as wordtoks paired with sentence indices, with
    /// paragraph-break markers between paragraphs (attributed to the
    /// preceding paragraph's last sentence) and optional BOF/EOF markers.
    pub fn as_wordtok_to_sent(&self, bof_eof: bool) -> Vec<(Wordtok, SentIndex)> {
        let mut out = Vec::new();
        if bof_eof {
            out.push((Wordtok::Bof, self.first_index()));
        }
        let last_para = self.paragraphs.len().saturating_sub(1);
        for (para_index, para) in self.paragraphs.iter().enumerate() {
            for (tok, sent_index) in para.as_wordtok_to_sent() {
                out.push((tok, SentIndex::new(para_index, sent_index)));
            }
            if para_index != last_para {
                out.push((
                    Wordtok::ParaBreak,
                    SentIndex::new(para_index, para.sentences.len().saturating_sub(1)),
                ));
            }
        }
        if bof_eof {
            out.push((Wordtok::Eof, self.last_index()));
        }
        out
    }

    /// The document as wordtoks, optionally bookended with BOF/EOF.
    pub fn as_wordtoks(&self, bof_eof: bool) -> Vec<Wordtok> {
        self.as_wordtok_to_sent(bof_eof)
            .into_iter()
            .map(|(tok, _)| tok)
            .collect()
    }

    /// Mappings between wordtok indices and sentence indices, in both
    /// directions.
    pub fn wordtok_mappings(&self) -> (WordtokMapping, SentenceMapping) {
        let mut wordtok_mapping = WordtokMapping::new();
        let mut sent_mapping = SentenceMapping::new();
        for (i, (_tok, sent_index)) in self.as_wordtok_to_sent(false).into_iter().enumerate() {
            wordtok_mapping.insert(i, sent_index);
            sent_mapping.entry(sent_index).or_default().push(i);
        }
        (wordtok_mapping, sent_mapping)
    }
}

impl fmt::Display for TextDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextDoc({})", self.size_summary())
    }
}
