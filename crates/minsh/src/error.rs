//! Error types for minsh
//!
//! Only failures that abort a whole line surface as [`Error`]. Command-level
//! failures (missing redirection file, unknown program, bad builtin operand)
//! are reported on the error stream and turned into exit codes by the
//! executor.

use std::io;
use std::path::PathBuf;

use crate::limits::LimitExceeded;
use thiserror::Error;

/// Result type alias using minsh's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// minsh error types.
#[derive(Error, Debug)]
pub enum Error {
    /// The line could not be parsed.
    #[error("syntax error: {message}")]
    Syntax {
        message: String,
        /// 1-based column of the offending operator
        column: usize,
    },

    /// A redirection target could not be opened.
    #[error("{}: {}", path.display(), describe_io_error(source))]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error while writing output or talking to a child process.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Resource limit exceeded.
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(#[from] LimitExceeded),

    /// Internal error for unexpected failures.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a syntax error at the given column.
    pub fn syntax(message: impl Into<String>, column: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            column,
        }
    }
}

/// Short, conventional description of an I/O error for user-facing messages.
///
/// Drops the `(os error N)` suffix that `io::Error`'s `Display` appends.
pub fn describe_io_error(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "No such file or directory".to_string(),
        io::ErrorKind::PermissionDenied => "Permission denied".to_string(),
        io::ErrorKind::AlreadyExists => "File exists".to_string(),
        io::ErrorKind::IsADirectory => "Is a directory".to_string(),
        io::ErrorKind::NotADirectory => "Not a directory".to_string(),
        io::ErrorKind::DirectoryNotEmpty => "Directory not empty".to_string(),
        _ => {
            let text = err.to_string();
            match text.find(" (os error") {
                Some(idx) => text[..idx].to_string(),
                None => text,
            }
        }
    }
}
