//! Parser module for minsh
//!
//! Folds the lexer's token stream into a [`Pipeline`]. Words are split into
//! [`WordPart`]s; every `$(...)` is parsed by a recursive call to [`parse`],
//! so nesting depth is bounded by the input, not by any shared state.

mod ast;
mod lexer;
mod span;
mod tokens;

pub use ast::*;
pub use lexer::{Lexer, SpannedToken, lex};
pub use span::{Position, Span};
pub use tokens::{LITERAL_DOLLAR, Token};

use crate::error::{Error, Result};

/// Deepest `$(...)` nesting accepted by the parser.
pub const MAX_SUBSTITUTION_NESTING: usize = 128;

/// Parse a command line into a pipeline.
///
/// Pure and reentrant; fails when a redirection operator has no target or
/// when `$(...)` nests deeper than [`MAX_SUBSTITUTION_NESTING`].
pub fn parse(input: &str) -> Result<Pipeline> {
    Parser::new(input).parse()
}

/// Check if a variable name is valid: `[A-Z_][A-Z0-9_]*`
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Parser for command lines.
pub struct Parser {
    tokens: std::vec::IntoIter<SpannedToken>,
    /// `$(...)` levels enclosing this input
    depth: usize,
}

impl Parser {
    /// Create a new parser for the given input.
    pub fn new(input: &str) -> Self {
        Self::nested(input, 0)
    }

    fn nested(input: &str, depth: usize) -> Self {
        let tokens = Lexer::new(input).tokenize();
        tracing::trace!(count = tokens.len(), depth, "lexed tokens");
        Self {
            tokens: tokens.into_iter(),
            depth,
        }
    }

    /// Parse the input and return the AST.
    pub fn parse(mut self) -> Result<Pipeline> {
        let mut pipeline = Pipeline::default();
        let mut name: Option<Word> = None;
        let mut args = Vec::new();
        let mut redirections = std::collections::BTreeMap::new();

        while let Some(spanned) = self.tokens.next() {
            let (role, append) = match &spanned.token {
                Token::Word(raw) => {
                    let word = parse_word_at(raw, self.depth, spanned.span.column())?;
                    if name.is_none() {
                        name = Some(word);
                    } else {
                        args.push(word);
                    }
                    continue;
                }
                Token::Pipe => {
                    flush(&mut pipeline, &mut name, &mut args, &mut redirections);
                    continue;
                }
                Token::RedirectOut => (StreamRole::Stdout, false),
                Token::RedirectAppend => (StreamRole::Stdout, true),
                Token::RedirectIn => (StreamRole::Stdin, false),
                Token::RedirectFd { fd, append } => (StreamRole::from_fd(fd), *append),
            };
            let target = self.expect_target(&spanned)?;
            redirections.insert(role, Redirection { target, append });
        }

        flush(&mut pipeline, &mut name, &mut args, &mut redirections);
        tracing::trace!(stages = pipeline.commands.len(), "parsed pipeline");
        Ok(pipeline)
    }

    /// Expect a word token as the target of the redirection operator `op`.
    fn expect_target(&mut self, op: &SpannedToken) -> Result<Word> {
        let column = op.span.column();
        match self.tokens.next() {
            Some(SpannedToken {
                token: Token::Word(raw),
                span,
            }) => parse_word_at(&raw, self.depth, span.column()),
            Some(other) => Err(Error::syntax(
                format!("Expected target after '{}', found '{}'", op.token, other.token),
                column,
            )),
            None => Err(Error::syntax(
                format!("Expected target after '{}'", op.token),
                column,
            )),
        }
    }
}

/// Push the command under construction if it has a name, then reset it.
fn flush(
    pipeline: &mut Pipeline,
    name: &mut Option<Word>,
    args: &mut Vec<Word>,
    redirections: &mut std::collections::BTreeMap<StreamRole, Redirection>,
) {
    let args = std::mem::take(args);
    let redirections = std::mem::take(redirections);
    if let Some(name) = name.take() {
        pipeline.commands.push(Command {
            name,
            args,
            redirections,
        });
    }
}

/// Parse a lexed word string into a Word with proper parts.
///
/// Malformed `$` sequences degrade to literal text; only a syntax error inside
/// a nested `$(...)` makes this fail.
pub fn parse_word(raw: &str) -> Result<Word> {
    parse_word_at(raw, 0, 1)
}

/// Word parsing for a word starting at `column`, inside `depth` levels of
/// `$(...)`.
fn parse_word_at(raw: &str, depth: usize, column: usize) -> Result<Word> {
    let mut word = Word::default();
    let mut rest = raw;

    while !rest.is_empty() {
        if let Some(body) = rest.strip_prefix("$(") {
            if depth >= MAX_SUBSTITUTION_NESTING {
                return Err(Error::syntax("command substitution nested too deeply", column));
            }
            let (inner_len, consumed) = lexer::scan_substitution(body);
            let pipeline = Parser::nested(&body[..inner_len], depth + 1).parse()?;
            word.parts.push(WordPart::CommandSubstitution(pipeline));
            rest = &body[consumed..];
            continue;
        }

        if let Some(after) = rest.strip_prefix('$') {
            let (part, len) = scan_variable(after);
            match part {
                Some(name) => word.parts.push(WordPart::Variable(name)),
                None => word.push_text(&rest[..1 + len].replace(LITERAL_DOLLAR, "$")),
            }
            rest = &after[len..];
            continue;
        }

        let end = rest.find('$').unwrap_or(rest.len());
        word.push_text(&rest[..end].replace(LITERAL_DOLLAR, "$"));
        rest = &rest[end..];
    }

    Ok(word)
}

/// Scan a variable reference right after a `$`.
///
/// Returns the variable name (if well-formed) and the number of bytes
/// consumed. Malformed references consume what they looked at so the caller
/// can emit it as literal text.
fn scan_variable(after: &str) -> (Option<String>, usize) {
    if let Some(braced) = after.strip_prefix('{') {
        return match braced.find('}') {
            Some(close) => {
                let name = &braced[..close];
                let len = close + 2;
                if is_valid_identifier(name) {
                    (Some(name.to_string()), len)
                } else {
                    (None, len)
                }
            }
            // Unclosed brace: leave it as literal text
            None => (None, 0),
        };
    }

    let mut len = 0;
    for (i, c) in after.char_indices() {
        let ok = if i == 0 {
            c.is_ascii_uppercase() || c == '_'
        } else {
            c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'
        };
        if !ok {
            break;
        }
        len = i + c.len_utf8();
    }

    if len == 0 {
        (None, 0)
    } else {
        (Some(after[..len].to_string()), len)
    }
}
