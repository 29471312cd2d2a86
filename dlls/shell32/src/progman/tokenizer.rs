//! Program Manager command tokenizer
//!
//! Splits a DDE execute payload into the bodies of its bracketed
//! commands:
//!
//! ```text
//!   [CreateGroup(Games)]  [AddItem(notepad,"a[b,c]d")]
//!    ^^^^^^^^^^^^^^^^^      ^^^^^^^^^^^^^^^^^^^^^^^^^
//! ```
//!
//! Whitespace around commands is skipped. Inside a command a quoted
//! segment may contain `]`. Anything else outside brackets ends the
//! sequence with a syntax error.

use std::borrow::Cow;
use std::fmt;

/// Bracket opening a command
pub const COMMAND_OPEN: char = '[';

/// Bracket closing a command
pub const COMMAND_CLOSE: char = ']';

/// Quote character protecting separators and brackets
pub const QUOTE: char = '"';

// ============================================================================
// Errors
// ============================================================================

/// Why the tokenizer stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenErrorKind {
    /// `[` with no matching `]`
    Unterminated,
    /// Non-whitespace text outside any brackets
    StrayText,
}

/// Tokenizer failure with the byte offset where it was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenError {
    pub kind: TokenErrorKind,
    pub offset: usize,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenErrorKind::Unterminated => {
                write!(f, "unterminated command starting at offset {}", self.offset)
            }
            TokenErrorKind::StrayText => {
                write!(f, "unexpected text outside brackets at offset {}", self.offset)
            }
        }
    }
}

// ============================================================================
// Payload Decoding
// ============================================================================

/// Decode an execute payload into text
///
/// The payload ends at the first NUL. Bytes that are not valid UTF-8 are
/// taken as Latin-1, which matches CP_WINANSI for the ASCII range and
/// never fails.
pub fn decode_payload(data: &[u8]) -> Cow<'_, str> {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let data = &data[..end];

    match core::str::from_utf8(data) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(data.iter().map(|&b| b as char).collect()),
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Lazy iterator over command bodies
///
/// Yields `Ok(body)` for each `[body]` pair, left to right. After the
/// first `Err` the iterator is exhausted.
pub struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    /// Tokenize `text`, stopping at an embedded NUL if present
    pub fn new(text: &'a str) -> Self {
        let text = match text.find('\0') {
            Some(end) => &text[..end],
            None => text,
        };

        Self {
            text,
            pos: 0,
            done: false,
        }
    }

    fn fail(&mut self, kind: TokenErrorKind, offset: usize) -> Option<Result<&'a str, TokenError>> {
        self.done = true;
        Some(Err(TokenError { kind, offset }))
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<&'a str, TokenError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let rest = &self.text[self.pos..];
        let trimmed = rest.trim_start();
        let start = self.pos + (rest.len() - trimmed.len());

        if trimmed.is_empty() {
            self.done = true;
            self.pos = self.text.len();
            return None;
        }

        if !trimmed.starts_with(COMMAND_OPEN) {
            return self.fail(TokenErrorKind::StrayText, start);
        }

        let body_start = start + COMMAND_OPEN.len_utf8();
        let mut in_quote = false;

        for (i, c) in self.text[body_start..].char_indices() {
            match c {
                QUOTE => in_quote = !in_quote,
                COMMAND_CLOSE if !in_quote => {
                    let body_end = body_start + i;
                    self.pos = body_end + COMMAND_CLOSE.len_utf8();
                    return Some(Ok(&self.text[body_start..body_end]));
                }
                _ => {}
            }
        }

        self.fail(TokenErrorKind::Unterminated, start)
    }
}

impl core::iter::FusedIterator for Tokenizer<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> Vec<Result<&str, TokenError>> {
        Tokenizer::new(text).collect()
    }

    #[test]
    fn test_single_command() {
        assert_eq!(collect("[CreateGroup(test)]"), vec![Ok("CreateGroup(test)")]);
    }

    #[test]
    fn test_empty_and_blank_payloads() {
        assert!(collect("").is_empty());
        assert!(collect("   \r\n\t ").is_empty());
    }

    #[test]
    fn test_surrounding_whitespace_is_skipped() {
        assert_eq!(
            collect("  [  AddItem  (  notepad  ,  test  )  ]  "),
            vec![Ok("  AddItem  (  notepad  ,  test  )  ")]
        );
    }

    #[test]
    fn test_multiple_commands_in_order() {
        assert_eq!(
            collect("[AddItem(notepad,one)] [AddItem(notepad,two)]"),
            vec![Ok("AddItem(notepad,one)"), Ok("AddItem(notepad,two)")]
        );
    }

    #[test]
    fn test_quoted_close_bracket_does_not_end_command() {
        assert_eq!(
            collect("[AddItem(notepad,\"a[b,c]d\")]"),
            vec![Ok("AddItem(notepad,\"a[b,c]d\")")]
        );
    }

    #[test]
    fn test_unquoted_close_bracket_ends_command_early() {
        let tokens = collect("[AddItem(notepad,a[b,c]d)]");
        assert_eq!(tokens[0], Ok("AddItem(notepad,a[b,c"));
        assert_eq!(
            tokens[1],
            Err(TokenError { kind: TokenErrorKind::StrayText, offset: 23 })
        );
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_unterminated_command() {
        assert_eq!(
            collect("[CreateGroup"),
            vec![Err(TokenError { kind: TokenErrorKind::Unterminated, offset: 0 })]
        );
    }

    #[test]
    fn test_bare_word_is_stray_text() {
        assert_eq!(
            collect("CreateGroup"),
            vec![Err(TokenError { kind: TokenErrorKind::StrayText, offset: 0 })]
        );
    }

    #[test]
    fn test_stops_after_error() {
        let mut tokenizer = Tokenizer::new("[A()] junk [B()]");
        assert_eq!(tokenizer.next(), Some(Ok("A()")));
        assert!(matches!(tokenizer.next(), Some(Err(_))));
        assert_eq!(tokenizer.next(), None);
    }

    #[test]
    fn test_nul_terminates_payload() {
        assert_eq!(collect("[A()]\0[B()]"), vec![Ok("A()")]);
    }

    #[test]
    fn test_decode_payload() {
        assert_eq!(decode_payload(b"[CreateGroup(x)]\0garbage"), "[CreateGroup(x)]");
        assert_eq!(decode_payload(b"[AddItem(caf\xe9)]"), "[AddItem(caf\u{e9})]");
    }
}
