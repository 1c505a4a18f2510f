//! Directional cursor over a wordtok slice.

use crate::error::{Result, TextError};
use crate::tokens::Wordtok;

/// Cursor over an array of wordtoks supporting predicate seeks in either
/// direction. Failed searches return a not-found [`TextError::Content`];
/// the cursor never wraps around at the ends.
///
/// ```
/// use textloom::tokens::{search_tokens, tokenize, Wordtok};
///
/// let toks = tokenize("Hello, world!", false);
/// let (index, tok) = search_tokens(&toks)
///     .at(0)
///     .seek_forward(|t: &Wordtok| t.is_word())
///     .unwrap()
///     .get_token()
///     .unwrap();
/// assert_eq!((index, tok.token_str().as_ref()), (3, "world"));
/// ```
pub struct TokenSearcher<'a> {
    toks: &'a [Wordtok],
    current_idx: usize,
}

impl<'a> TokenSearcher<'a> {
    /// Position the cursor at an index. Negative indices count from the end.
    pub fn at(mut self, index: isize) -> Self {
        self.current_idx = if index >= 0 {
            index as usize
        } else {
            (self.toks.len() as isize + index).max(0) as usize
        };
        self
    }

    /// Position the cursor at the first token.
    pub fn start(mut self) -> Self {
        self.current_idx = 0;
        self
    }

    /// Position the cursor one past the last token.
    pub fn end(mut self) -> Self {
        self.current_idx = self.toks.len();
        self
    }

    /// Seek backward (exclusive of the current position) to the nearest
    /// token matching the predicate.
    pub fn seek_back(mut self, predicate: impl Fn(&Wordtok) -> bool) -> Result<Self> {
        let upper = self.current_idx.min(self.toks.len());
        for idx in (0..upper).rev() {
            if predicate(&self.toks[idx]) {
                self.current_idx = idx;
                return Ok(self);
            }
        }
        Err(TextError::Content(
            "no matching token found before the current index".into(),
        ))
    }

    /// Seek forward (exclusive of the current position) to the nearest
    /// token matching the predicate.
    pub fn seek_forward(mut self, predicate: impl Fn(&Wordtok) -> bool) -> Result<Self> {
        for idx in self.current_idx + 1..self.toks.len() {
            if predicate(&self.toks[idx]) {
                self.current_idx = idx;
                return Ok(self);
            }
        }
        Err(TextError::Content(
            "no matching token found after the current index".into(),
        ))
    }

    /// Step back one token.
    pub fn prev(mut self) -> Result<Self> {
        if self.current_idx == 0 {
            return Err(TextError::Content("no previous token available".into()));
        }
        self.current_idx -= 1;
        Ok(self)
    }

    /// Step forward one token.
    pub fn next(mut self) -> Result<Self> {
        if self.current_idx + 1 >= self.toks.len() {
            return Err(TextError::Content("no next token available".into()));
        }
        self.current_idx += 1;
        Ok(self)
    }

    /// The cursor's current index.
    pub fn get_index(&self) -> usize {
        self.current_idx
    }

    /// The current index and token. Fails if the cursor is past the end.
    pub fn get_token(&self) -> Result<(usize, &'a Wordtok)> {
        self.toks
            .get(self.current_idx)
            .map(|tok| (self.current_idx, tok))
            .ok_or_else(|| TextError::Content("cursor is past the end of the tokens".into()))
    }
}

/// Build a predicate matching any of the given literal token forms.
pub fn one_of(allowed: &[&str]) -> impl Fn(&Wordtok) -> bool + use<> {
    let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
    move |tok: &Wordtok| allowed.iter().any(|s| tok.token_str() == s.as_str())
}

/// Start a token search over the given wordtoks.
pub fn search_tokens(wordtoks: &[Wordtok]) -> TokenSearcher<'_> {
    TokenSearcher {
        toks: wordtoks,
        current_idx: 0,
    }
}
