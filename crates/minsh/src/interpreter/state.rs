//! Result and option types for pipeline execution

/// Whether the session should keep reading lines after a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlFlow {
    /// Keep going
    #[default]
    Continue,
    /// `exit` ran; the front end should terminate with this code
    Exit(i32),
}

/// Result of executing a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Standard output (only filled when captured)
    pub stdout: String,
    /// Standard error (only filled when captured)
    pub stderr: String,
    /// Exit code of the last stage that ran
    pub exit_code: i32,
    /// Whether the session was asked to end
    pub control_flow: ControlFlow,
}

impl ExecResult {
    /// Check if the result indicates success.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Exit code requested by `exit`, if any.
    pub fn exit_requested(&self) -> Option<i32> {
        match self.control_flow {
            ControlFlow::Exit(code) => Some(code),
            ControlFlow::Continue => None,
        }
    }
}

/// How a pipeline's streams are connected to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOptions {
    /// Collect the last stage's stdout into [`ExecResult::stdout`]
    /// instead of writing it to the terminal
    pub capture_stdout: bool,
    /// Collect error output into [`ExecResult::stderr`]
    pub capture_stderr: bool,
    /// Give the first stage an empty stdin instead of the process's own
    pub null_stdin: bool,
}

impl ExecOptions {
    /// Everything goes to the terminal.
    pub fn terminal() -> Self {
        Self::default()
    }

    /// Both output streams are captured and stdin is empty.
    pub fn captured() -> Self {
        Self {
            capture_stdout: true,
            capture_stderr: true,
            null_stdin: true,
        }
    }
}
