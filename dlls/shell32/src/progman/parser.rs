//! Program Manager argument parser
//!
//! Turns one command body produced by the tokenizer into a [`Command`]:
//!
//! ```text
//!   AddItem ( notepad , " My Editor " )
//!   ^^^^^^^   ^^^^^^^   ^^^^^^^^^^^^^
//!    name      arg 0        arg 1 = " My Editor " without the quotes
//! ```

use std::fmt;

use super::tokenizer::QUOTE;

/// Opens the argument list
pub const ARGS_OPEN: char = '(';

/// Closes the argument list
pub const ARGS_CLOSE: char = ')';

/// Separates arguments
pub const ARG_SEPARATOR: char = ',';

/// Parsed command, not yet dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name as written, whitespace trimmed
    pub name: String,
    /// Arguments in order
    pub args: Vec<String>,
    /// Whether a parenthesized argument list was present
    pub has_arg_list: bool,
}

impl Command {
    /// Number of arguments
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Argument at `index`, if present
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Syntax error inside a command body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// `(` without a matching `)`
    MissingClose,
    /// Quoted segment never closed
    UnterminatedQuote,
    /// Text after the closing `)`
    TrailingText(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingClose => write!(f, "missing `)`"),
            ParseError::UnterminatedQuote => write!(f, "unterminated quoted argument"),
            ParseError::TrailingText(text) => write!(f, "unexpected `{}` after `)`", text),
        }
    }
}

/// Parse one command body
pub fn parse_command(body: &str) -> Result<Command, ParseError> {
    let body = body.trim();

    let open = match body.find(ARGS_OPEN) {
        Some(open) => open,
        None => {
            return Ok(Command {
                name: body.to_string(),
                args: Vec::new(),
                has_arg_list: false,
            });
        }
    };

    let name = body[..open].trim().to_string();
    let (args, rest) = parse_arguments(&body[open + ARGS_OPEN.len_utf8()..])?;

    let rest = rest.trim();
    if !rest.is_empty() {
        return Err(ParseError::TrailingText(rest.to_string()));
    }

    Ok(Command {
        name,
        args,
        has_arg_list: true,
    })
}

/// Split an argument list up to its closing `)`
///
/// Returns the arguments and the text following the `)`.
fn parse_arguments(text: &str) -> Result<(Vec<String>, &str), ParseError> {
    let mut args = Vec::new();
    let mut current = String::new();
    // Bytes of `current` that came from (or precede the end of) a quoted
    // segment and must survive trailing-whitespace trimming
    let mut protected = 0;
    let mut started = false;
    let mut in_quote = false;

    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if in_quote {
            if c == QUOTE {
                if matches!(chars.peek(), Some(&(_, QUOTE))) {
                    chars.next();
                    current.push(QUOTE);
                } else {
                    in_quote = false;
                    protected = current.len();
                }
            } else {
                current.push(c);
            }
            continue;
        }

        match c {
            QUOTE => {
                in_quote = true;
                started = true;
            }
            ARG_SEPARATOR => {
                args.push(finish_argument(&mut current, protected));
                protected = 0;
                started = false;
            }
            ARGS_CLOSE => {
                if started || !args.is_empty() {
                    args.push(finish_argument(&mut current, protected));
                }
                return Ok((args, &text[i + ARGS_CLOSE.len_utf8()..]));
            }
            c if c.is_whitespace() && !started => {}
            c => {
                started = true;
                current.push(c);
            }
        }
    }

    if in_quote {
        Err(ParseError::UnterminatedQuote)
    } else {
        Err(ParseError::MissingClose)
    }
}

/// Take the accumulated argument, trimming unquoted trailing whitespace
fn finish_argument(current: &mut String, protected: usize) -> String {
    let keep = protected.max(current.trim_end().len());
    current.truncate(keep);
    core::mem::take(current)
}
