//! Pipeline executor
//!
//! Each stage of a pipeline goes through three steps before the next one
//! starts:
//!
//! 1. **Expand** the name, arguments and redirection targets. Command
//!    substitutions run a nested pipeline in capture mode.
//! 2. **Redirect**: open the targets relative to the session directory. A
//!    target that cannot be opened ends the whole pipeline with status 1.
//! 3. **Run** the builtin or external program.
//!
//! Pipes are emulated with buffers: a stage's complete output becomes the
//! next stage's input.

mod io;
mod process;
mod redirect;
mod state;

pub use io::{Io, Sink};
pub use process::{EXIT_NOT_FOUND, EXIT_TIMEOUT};
pub use state::{ControlFlow, ExecOptions, ExecResult};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::builtins::{self, Builtin, Completion};
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::limits::{ExecutionCounters, ExecutionLimits};
use crate::logging::{LogConfig, sanitize_for_log};
use crate::parser::{Command, Pipeline, Word, WordPart};
use process::{ExternalCommand, StdinSource};
use redirect::ResolvedRedirect;

/// How a single stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageOutcome {
    /// Ran to completion with a status
    Finished(i32),
    /// `exit` ran
    ExitShell(i32),
    /// Could not start (redirection failure); the pipeline stops
    Aborted(i32),
}

/// Where a stage's input comes from before `<` is applied.
enum StageInput {
    Inherit,
    Null,
    Piped(Vec<u8>),
}

/// Interpreter state.
pub struct Interpreter {
    env: Environment,
    cwd: PathBuf,
    builtins: HashMap<String, Box<dyn Builtin>>,
    limits: ExecutionLimits,
    counters: ExecutionCounters,
    log_config: LogConfig,
    /// Set when an expansion failed and the current command must not run
    expansion_failed: bool,
}

impl Interpreter {
    /// Create a new interpreter with the default builtins.
    pub fn new(env: Environment, cwd: PathBuf) -> Self {
        let builtins = builtins::default_builtins()
            .into_iter()
            .map(|(name, builtin)| (name.to_string(), builtin))
            .collect();

        Self {
            env,
            cwd,
            builtins,
            limits: ExecutionLimits::default(),
            counters: ExecutionCounters::default(),
            log_config: LogConfig::default(),
            expansion_failed: false,
        }
    }

    /// Register or replace a builtin.
    pub fn register_builtin(&mut self, name: impl Into<String>, builtin: Box<dyn Builtin>) {
        self.builtins.insert(name.into(), builtin);
    }

    /// Set resource limits.
    pub fn set_limits(&mut self, limits: ExecutionLimits) {
        self.limits = limits;
    }

    /// Set logging configuration.
    pub fn set_log_config(&mut self, log_config: LogConfig) {
        self.log_config = log_config;
    }

    /// Logging configuration in use.
    pub fn log_config(&self) -> &LogConfig {
        &self.log_config
    }

    /// Session environment.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Session environment (mutable).
    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Session working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Execute a pipeline.
    ///
    /// Command-level failures are reported on the error stream and turned
    /// into exit codes; only broken output streams and similar surface as
    /// `Err`.
    pub fn execute_pipeline<'a>(
        &'a mut self,
        pipeline: &'a Pipeline,
        options: ExecOptions,
    ) -> BoxFuture<'a, Result<ExecResult>> {
        // Boxed: command substitution re-enters here from inside expansion
        async move { self.run_pipeline(pipeline, options).await }.boxed()
    }

    async fn run_pipeline(&mut self, pipeline: &Pipeline, options: ExecOptions) -> Result<ExecResult> {
        let mut result = ExecResult::default();
        let mut stderr = if options.capture_stderr {
            Sink::buffer()
        } else {
            Sink::Stderr
        };
        let mut piped: Option<Vec<u8>> = None;
        let mut final_stdout = Vec::new();
        let last = pipeline.commands.len().saturating_sub(1);

        for (i, command) in pipeline.commands.iter().enumerate() {
            let input = match piped.take() {
                Some(bytes) => StageInput::Piped(bytes),
                None if options.null_stdin => StageInput::Null,
                None => StageInput::Inherit,
            };
            let mut stdout = if i < last || options.capture_stdout {
                Sink::buffer()
            } else {
                Sink::Stdout
            };

            tracing::debug!(stage = i, stages = pipeline.commands.len(), "stage starting");
            let outcome = self
                .run_stage(command, input, &mut stdout, &mut stderr, options)
                .await?;
            tracing::debug!(stage = i, ?outcome, "stage finished");

            match outcome {
                StageOutcome::Finished(code) => result.exit_code = code,
                StageOutcome::ExitShell(code) => {
                    result.exit_code = code;
                    result.control_flow = ControlFlow::Exit(code);
                    break;
                }
                StageOutcome::Aborted(code) => {
                    result.exit_code = code;
                    break;
                }
            }

            if i < last {
                piped = Some(stdout.take_buffer());
            } else {
                final_stdout = stdout.take_buffer();
            }
        }

        if options.capture_stdout {
            result.stdout = String::from_utf8_lossy(&final_stdout).into_owned();
        }
        if options.capture_stderr {
            result.stderr = String::from_utf8_lossy(&stderr.take_buffer()).into_owned();
        }
        Ok(result)
    }

    async fn run_stage(
        &mut self,
        command: &Command,
        input: StageInput,
        stdout: &mut Sink,
        stderr: &mut Sink,
        options: ExecOptions,
    ) -> Result<StageOutcome> {
        // Expanding
        let name = self.expand_word(&command.name, stderr, options).await?;
        let mut args = Vec::with_capacity(command.args.len());
        for arg in &command.args {
            args.push(self.expand_word(arg, stderr, options).await?);
        }
        let mut redirects = Vec::with_capacity(command.redirections.len());
        for (role, redirection) in &command.redirections {
            redirects.push(ResolvedRedirect {
                role: role.clone(),
                target: self.expand_word(&redirection.target, stderr, options).await?,
                append: redirection.append,
            });
        }
        if std::mem::take(&mut self.expansion_failed) {
            return Ok(StageOutcome::Finished(1));
        }

        let files = match redirect::open_all(&self.cwd, &redirects).await {
            Ok(files) => files,
            Err(e @ Error::Redirect { .. }) => {
                stderr.write_all(format!("minsh: {}\n", e).as_bytes())?;
                return Ok(StageOutcome::Aborted(1));
            }
            Err(e) => return Err(e),
        };

        // Running
        if name.is_empty() {
            return Ok(StageOutcome::Finished(0));
        }
        tracing::debug!(
            command = %sanitize_for_log(&name),
            args = args.len(),
            redirects = redirects.len(),
            "running command"
        );

        let mut file_stdout = files.stdout.map(Sink::File);
        let mut file_stderr = files.stderr.map(Sink::File);
        let out = file_stdout.as_mut().unwrap_or(stdout);
        let err = file_stderr.as_mut().unwrap_or(stderr);
        // Opened but not connected; closed when the stage ends
        let _held = files.held;

        if let Some(builtin) = self.builtins.get(name.as_str()) {
            let stdin = match (files.stdin, input) {
                (Some(mut file), _) => Some(read_all(&mut file)?),
                (None, StageInput::Piped(bytes)) => Some(bytes),
                (None, StageInput::Inherit | StageInput::Null) => None,
            };
            let ctx = builtins::Context {
                args: &args,
                env: &mut self.env,
                cwd: &mut self.cwd,
                stdin: stdin.as_deref(),
                io: Io::new(&mut *out, &mut *err),
            };
            return Ok(match builtin.execute(ctx).await {
                Ok(Completion::Code(code)) => StageOutcome::Finished(code),
                Ok(Completion::ExitShell(code)) => StageOutcome::ExitShell(code),
                Err(e) => {
                    err.write_all(format!("{}: {}\n", name, e).as_bytes())?;
                    StageOutcome::Finished(1)
                }
            });
        }

        let stdin = match (files.stdin, input) {
            (Some(file), _) => StdinSource::File(file),
            (None, StageInput::Piped(bytes)) => StdinSource::Bytes(bytes),
            (None, StageInput::Null) => StdinSource::Null,
            (None, StageInput::Inherit) => StdinSource::Inherit,
        };
        let external = ExternalCommand {
            name: &name,
            args: &args,
            env: &self.env,
            cwd: &self.cwd,
            timeout: self.limits.command_timeout,
        };
        let code = external.run(stdin, out, err).await?;
        Ok(StageOutcome::Finished(code))
    }

    /// Expand a word to a single string.
    ///
    /// Substitution errors are written to `stderr` and mark the current
    /// command as failed.
    async fn expand_word(&mut self, word: &Word, stderr: &mut Sink, options: ExecOptions) -> Result<String> {
        let mut result = String::new();

        for part in &word.parts {
            match part {
                WordPart::Text(text) => result.push_str(text),
                WordPart::Variable(name) => {
                    // Unset variables expand to nothing
                    let value = self.env.get(name).unwrap_or("");
                    tracing::trace!(
                        name = %name,
                        value = %self.log_config.redact_var(name, value),
                        "expanded variable"
                    );
                    result.push_str(value);
                }
                WordPart::CommandSubstitution(inner) => {
                    if let Err(e) = self.counters.push_substitution(&self.limits).map_err(Error::from) {
                        stderr.write_all(format!("minsh: {}\n", e).as_bytes())?;
                        self.expansion_failed = true;
                        continue;
                    }

                    let nested = ExecOptions {
                        capture_stdout: true,
                        ..options
                    };
                    let output = self.execute_pipeline(inner, nested).await;
                    self.counters.pop_substitution();
                    let output = output?;

                    if !output.stderr.is_empty() {
                        stderr.write_all(output.stderr.as_bytes())?;
                    }
                    // `exit` inside $(...) only ends the nested pipeline
                    result.push_str(output.stdout.trim_end_matches(['\n', '\r']));
                }
            }
        }

        Ok(result)
    }
}

fn read_all(file: &mut std::fs::File) -> Result<Vec<u8>> {
    use std::io::Read;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}
