//! AST types for parsed command lines
//!
//! A line parses into a single [`Pipeline`]; command substitutions nest a
//! whole `Pipeline` inside a [`WordPart`].

use std::collections::BTreeMap;
use std::fmt;

/// An ordered list of commands whose outputs chain stage to stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    /// Stages in execution and data-flow order. Every stage has a name.
    pub commands: Vec<Command>,
}

impl Pipeline {
    /// Whether the pipeline has no stages (empty line, only pipes).
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// One invocation within a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name
    pub name: Word,
    /// Command arguments
    pub args: Vec<Word>,
    /// Redirections keyed by the stream they replace
    pub redirections: BTreeMap<StreamRole, Redirection>,
}

impl Command {
    /// Look up the redirection for a stream, if any.
    pub fn redirection(&self, role: &StreamRole) -> Option<&Redirection> {
        self.redirections.get(role)
    }
}

/// The stream a redirection targets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamRole {
    Stdin,
    Stdout,
    Stderr,
    /// Any descriptor other than 0, 1 and 2, kept as written.
    Fd(String),
}

impl StreamRole {
    /// Map a descriptor number to its role: `0`, `1`, `2` become the standard
    /// streams, anything else stays a numbered descriptor.
    pub fn from_fd(fd: &str) -> Self {
        match fd {
            "0" => StreamRole::Stdin,
            "1" => StreamRole::Stdout,
            "2" => StreamRole::Stderr,
            other => StreamRole::Fd(other.to_string()),
        }
    }
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamRole::Stdin => write!(f, "stdin"),
            StreamRole::Stdout => write!(f, "stdout"),
            StreamRole::Stderr => write!(f, "stderr"),
            StreamRole::Fd(n) => write!(f, "fd{}", n),
        }
    }
}

/// I/O redirection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    /// File to open, expanded at execution time
    pub target: Word,
    /// Open for append instead of truncate (ignored for stdin)
    pub append: bool,
}

/// A word (potentially with expansions).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Word {
    pub parts: Vec<WordPart>,
}

impl Word {
    /// Create a simple literal word.
    pub fn literal(s: impl Into<String>) -> Self {
        Self {
            parts: vec![WordPart::Text(s.into())],
        }
    }

    /// Return the text if the word has no expansions.
    pub fn as_literal(&self) -> Option<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                WordPart::Text(s) => out.push_str(s),
                WordPart::Variable(_) | WordPart::CommandSubstitution(_) => return None,
            }
        }
        Some(out)
    }

    /// Append literal text, merging with a trailing text part.
    pub(crate) fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(WordPart::Text(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(WordPart::Text(text.to_string()));
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                WordPart::Text(s) => write!(f, "{}", s)?,
                WordPart::Variable(name) => write!(f, "${{{}}}", name)?,
                WordPart::CommandSubstitution(pipeline) => write!(f, "$({})", pipeline)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cmd) in self.commands.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", cmd.name)?;
            for arg in &cmd.args {
                write!(f, " {}", arg)?;
            }
            for (role, redir) in &cmd.redirections {
                let op = match (role, redir.append) {
                    (StreamRole::Stdin, _) => "<".to_string(),
                    (StreamRole::Stdout, false) => ">".to_string(),
                    (StreamRole::Stdout, true) => ">>".to_string(),
                    (StreamRole::Stderr, false) => "2>".to_string(),
                    (StreamRole::Stderr, true) => "2>>".to_string(),
                    (StreamRole::Fd(n), false) => format!("{}>", n),
                    (StreamRole::Fd(n), true) => format!("{}>>", n),
                };
                write!(f, " {} {}", op, redir.target)?;
            }
        }
        Ok(())
    }
}

/// Parts of a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    /// Literal text
    Text(String),
    /// Variable expansion ($VAR or ${VAR})
    Variable(String),
    /// Command substitution ($(...))
    CommandSubstitution(Pipeline),
}
