//! Token types for the lexer

use std::fmt;

/// Marks a `$` that must stay literal (single-quoted or escaped as `\$`).
///
/// The lexer writes it into word text in place of the dollar sign and the
/// word-part parser decodes it back, so a later expansion pass never mistakes
/// it for a variable sigil.
pub const LITERAL_DOLLAR: char = '\0';

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word (command name, argument, redirection target).
    ///
    /// Quotes and escapes are already resolved; `$(...)` text is kept verbatim.
    Word(String),

    /// Pipe (|)
    Pipe,

    /// Redirect output (>)
    RedirectOut,

    /// Redirect output append (>>)
    RedirectAppend,

    /// Redirect input (<)
    RedirectIn,

    /// Redirect with an explicit file descriptor (e.g. `2>`, `2>>`)
    RedirectFd { fd: String, append: bool },
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{}", w),
            Token::Pipe => write!(f, "|"),
            Token::RedirectOut => write!(f, ">"),
            Token::RedirectAppend => write!(f, ">>"),
            Token::RedirectIn => write!(f, "<"),
            Token::RedirectFd { fd, append } => {
                write!(f, "{}{}", fd, if *append { ">>" } else { ">" })
            }
        }
    }
}
