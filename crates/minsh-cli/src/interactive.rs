//! Interactive prompt
//!
//! Plain `minsh> ` prompt with the line editor's in-memory history.

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::{Flow, run_line};
use minsh::Shell;

const PROMPT: &str = "minsh> ";

/// Read and execute lines until `exit` or end of input.
///
/// Returns the exit code for the process.
pub async fn run(shell: &mut Shell) -> Result<i32> {
    let mut editor = DefaultEditor::new().context("Failed to initialize line editor")?;
    let mut status = 0;

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                match run_line(shell, &line).await {
                    Flow::Continue(code) => status = code,
                    Flow::Exit(code) => return Ok(code),
                }
            }
            // Ctrl-C drops the current line
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => return Ok(status),
            Err(e) => return Err(e).context("Failed to read line"),
        }
    }
}
