//! Output sinks for pipeline stages
//!
//! Every stage writes its stdout and stderr to a [`Sink`]: the terminal, an
//! in-memory buffer (pipes and capture mode) or a redirection file. Builtins
//! only see the [`Io`] view, so they never need to know which one it is.

use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::process::Stdio;

/// Where a stream's bytes end up.
#[derive(Debug)]
pub enum Sink {
    /// The process's own stdout
    Stdout,
    /// The process's own stderr
    Stderr,
    /// Collected in memory
    Buffer(Vec<u8>),
    /// A redirection target
    File(File),
}

impl Sink {
    /// An empty in-memory sink.
    pub fn buffer() -> Self {
        Sink::Buffer(Vec::new())
    }

    /// Write all bytes and flush terminal streams.
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Sink::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(data)?;
                out.flush()
            }
            Sink::Stderr => {
                let mut err = io::stderr().lock();
                err.write_all(data)?;
                err.flush()
            }
            Sink::Buffer(buf) => {
                buf.extend_from_slice(data);
                Ok(())
            }
            Sink::File(file) => file.write_all(data),
        }
    }

    /// Whether the sink is an interactive terminal.
    pub fn is_tty(&self) -> bool {
        match self {
            Sink::Stdout => io::stdout().is_terminal(),
            Sink::Stderr => io::stderr().is_terminal(),
            Sink::Buffer(_) | Sink::File(_) => false,
        }
    }

    /// Take the buffered bytes, leaving the buffer empty.
    ///
    /// Non-buffer sinks have nothing to take.
    pub fn take_buffer(&mut self) -> Vec<u8> {
        match self {
            Sink::Buffer(buf) => std::mem::take(buf),
            _ => Vec::new(),
        }
    }

    /// Child process stdio for this sink.
    ///
    /// Buffers are piped; the caller copies the child's output in afterwards.
    pub(crate) fn to_stdio(&self) -> io::Result<Stdio> {
        Ok(match self {
            Sink::Stdout | Sink::Stderr => Stdio::inherit(),
            Sink::Buffer(_) => Stdio::piped(),
            Sink::File(file) => Stdio::from(file.try_clone()?),
        })
    }
}

/// Output handles given to a builtin.
pub struct Io<'a> {
    stdout: &'a mut Sink,
    stderr: &'a mut Sink,
}

impl<'a> Io<'a> {
    /// Bind a builtin's output to the resolved sinks.
    pub fn new(stdout: &'a mut Sink, stderr: &'a mut Sink) -> Self {
        Self { stdout, stderr }
    }

    /// Write to the command's standard output.
    pub fn write_stdout(&mut self, data: impl AsRef<[u8]>) -> io::Result<()> {
        self.stdout.write_all(data.as_ref())
    }

    /// Write to the command's standard error.
    pub fn write_stderr(&mut self, data: impl AsRef<[u8]>) -> io::Result<()> {
        self.stderr.write_all(data.as_ref())
    }

    /// Whether standard output is a terminal (for coloring).
    pub fn stdout_is_tty(&self) -> bool {
        self.stdout.is_tty()
    }

    /// Whether standard error is a terminal.
    pub fn stderr_is_tty(&self) -> bool {
        self.stderr.is_tty()
    }
}
