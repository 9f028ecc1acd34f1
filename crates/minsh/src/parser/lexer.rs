//! Lexer for command lines
//!
//! Tokenizes input into a flat stream of words, pipes and redirection
//! operators with source position tracking. The lexer never fails: malformed
//! quoting is resolved best-effort and missing redirection targets are left
//! for the parser to report.

use super::span::{Position, Span};
use super::tokens::{LITERAL_DOLLAR, Token};

/// A token with its source location span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexer for command lines.
pub struct Lexer<'a> {
    input: &'a str,
    /// Current position in the input
    position: Position,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: Position::new(),
        }
    }

    /// Tokenize the whole input.
    pub fn tokenize(mut self) -> Vec<SpannedToken> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_spanned_token() {
            tokens.push(token);
        }
        tokens
    }

    /// Get the next token with its source span.
    fn next_spanned_token(&mut self) -> Option<SpannedToken> {
        loop {
            self.skip_whitespace();
            if self.peek_char().is_none() {
                return None;
            }
            let start = self.position;
            if let Some(token) = self.next_token_inner() {
                return Some(SpannedToken {
                    token,
                    span: Span::from_positions(start, self.position),
                });
            }
            // An empty word (e.g. `''`) produces no token; keep scanning.
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position.offset..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position.advance(ch);
        Some(ch)
    }

    fn advance_bytes(&mut self, len: usize) {
        let end = self.position.offset + len;
        while self.position.offset < end {
            if self.advance().is_none() {
                break;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if is_blank(ch) {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Internal: get next token at the current (non-blank) position.
    fn next_token_inner(&mut self) -> Option<Token> {
        if let Some((token, len)) = match_fd_redirect(self.rest()) {
            self.advance_bytes(len);
            return Some(token);
        }
        if let Some((token, len)) = match_operator(self.rest()) {
            self.advance_bytes(len);
            return Some(token);
        }
        self.read_word()
    }

    fn read_word(&mut self) -> Option<Token> {
        let mut word = String::new();
        let mut in_single = false;
        let mut in_double = false;

        while let Some(ch) = self.peek_char() {
            if !in_single && !in_double {
                if is_blank(ch) {
                    break;
                }
                let rest = self.rest();
                if match_fd_redirect(rest).is_some() || match_operator(rest).is_some() {
                    break;
                }
            }

            if ch == '\\' && !in_single {
                self.advance();
                match self.peek_char() {
                    // In double quotes only ", $ and \ are escapable
                    Some(next) if in_double && !matches!(next, '"' | '$' | '\\') => {
                        word.push('\\');
                    }
                    Some(next) => {
                        word.push(if next == '$' { LITERAL_DOLLAR } else { next });
                        self.advance();
                    }
                    // Trailing lone backslash is dropped
                    None => {}
                }
                continue;
            }

            if ch == '\'' && !in_double {
                in_single = !in_single;
                self.advance();
                continue;
            }

            if ch == '"' && !in_single {
                in_double = !in_double;
                self.advance();
                continue;
            }

            if ch == '$' {
                if in_single {
                    word.push(LITERAL_DOLLAR);
                    self.advance();
                    continue;
                }
                if let Some(body) = self.rest().strip_prefix("$(") {
                    // Copy the whole substitution verbatim for the parser
                    let (_, consumed) = scan_substitution(body);
                    let len = 2 + consumed;
                    word.push_str(&self.rest()[..len]);
                    self.advance_bytes(len);
                    continue;
                }
            }

            word.push(ch);
            self.advance();
        }

        if word.is_empty() {
            None
        } else {
            Some(Token::Word(word))
        }
    }
}

/// Tokenize a line, dropping span information.
pub fn lex(input: &str) -> Vec<Token> {
    Lexer::new(input)
        .tokenize()
        .into_iter()
        .map(|t| t.token)
        .collect()
}

fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Match `\d+(>>|>)` at the start of `input`, returning the token and its
/// byte length.
fn match_fd_redirect(input: &str) -> Option<(Token, usize)> {
    let digits = input.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let fd = input[..digits].to_string();
    let after = &input[digits..];
    if after.starts_with(">>") {
        Some((Token::RedirectFd { fd, append: true }, digits + 2))
    } else if after.starts_with('>') {
        Some((Token::RedirectFd { fd, append: false }, digits + 1))
    } else {
        None
    }
}

/// Longest-match operator at the start of `input`.
fn match_operator(input: &str) -> Option<(Token, usize)> {
    if input.starts_with(">>") {
        Some((Token::RedirectAppend, 2))
    } else if input.starts_with('>') {
        Some((Token::RedirectOut, 1))
    } else if input.starts_with('<') {
        Some((Token::RedirectIn, 1))
    } else if input.starts_with('|') {
        Some((Token::Pipe, 1))
    } else {
        None
    }
}

/// Scan the body of a command substitution (the text right after `$(`).
///
/// Returns `(inner_len, consumed)`: the byte length of the inner text and the
/// byte length consumed including the closing `)`. Quotes and backslashes
/// inside the body are tracked independently of the enclosing word so that a
/// quoted `)` does not close the substitution. Without a matching `)` the
/// whole remaining input is the inner text.
pub(crate) fn scan_substitution(body: &str) -> (usize, usize) {
    let mut depth = 1usize;
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = body.char_indices();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' if !in_single => {
                chars.next();
            }
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '(' if !in_single && !in_double => depth += 1,
            ')' if !in_single && !in_double => {
                depth -= 1;
                if depth == 0 {
                    return (idx, idx + 1);
                }
            }
            _ => {}
        }
    }

    (body.len(), body.len())
}
