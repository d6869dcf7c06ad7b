//! Token stream over a web document.
//!
//! The tokenizer splits raw text into three kinds of tokens: two-character
//! `@x` directive markers, bare newlines, and the literal spans between
//! them. Literal spans never contain a newline; every newline is its own
//! token, which keeps the running line count a simple matter of counting
//! newline tokens as they pass.

use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern matching a directive marker or a newline. `.` does not match
/// `\n`, so a `@` at end of line falls through as literal text.
static TOKEN_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"@.|\n").unwrap());

/// Single-pass token iterator carrying its own line-counter state.
///
/// Consumed exactly once; there is no lookahead beyond the token handed
/// out. `line_number` reports the number of newlines seen so far.
pub struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,
    line_number: usize,
}

impl<'a> Tokenizer<'a> {
    /// Creates a tokenizer over the whole document text.
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line_number: 0,
        }
    }

    /// Newlines consumed so far, in tokens already produced.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.pos >= self.text.len() {
            return None;
        }
        let rest = &self.text[self.pos..];
        let token = match TOKEN_BREAK.find(rest) {
            // Directive marker or newline at the cursor.
            Some(m) if m.start() == 0 => &rest[..m.end()],
            // Literal span up to the next break.
            Some(m) => &rest[..m.start()],
            None => rest,
        };
        self.pos += token.len();
        self.line_number += token.matches('\n').count();
        Some(token)
    }
}
