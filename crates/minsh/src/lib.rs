//! minsh - a minimal command shell
//!
//! Lines are lexed and parsed into a [`Pipeline`], then executed against the
//! host: builtins run in process, everything else is spawned as a child.
//!
//! # Example
//!
//! ```rust
//! use minsh::Shell;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut shell = Shell::builder()
//!         .inherit_process_env(false)
//!         .no_dotenv()
//!         .env("GREETING", "hello")
//!         .build();
//!     let result = shell.exec("echo $GREETING | echo $(echo world)").await?;
//!     assert_eq!(result.stdout, "world\n");
//!     assert_eq!(result.exit_code, 0);
//!     Ok(())
//! }
//! ```

pub mod builtins;
pub mod env;
mod error;
mod interpreter;
mod limits;
mod logging;
pub mod parser;

pub use async_trait::async_trait;
pub use builtins::{Builtin, Completion, Context as BuiltinContext};
pub use env::Environment;
pub use error::{Error, Result};
pub use interpreter::{ControlFlow, EXIT_NOT_FOUND, EXIT_TIMEOUT, ExecOptions, ExecResult, Io, Sink};
pub use limits::{ExecutionLimits, LimitExceeded};
pub use logging::LogConfig;
pub use parser::{Pipeline, parse};

use std::path::{Path, PathBuf};

use interpreter::Interpreter;
use logging::format_line_for_log;

/// Main entry point for minsh.
///
/// A shell owns one session: its environment and working directory persist
/// across lines.
pub struct Shell {
    interpreter: Interpreter,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    /// Create a shell with the process environment, the process working
    /// directory and `<cwd>/.env` loaded.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new ShellBuilder for customized configuration.
    pub fn builder() -> ShellBuilder {
        ShellBuilder::default()
    }

    /// Parse a line without executing it.
    pub fn parse_line(&self, line: &str) -> Result<Pipeline> {
        parse(line)
    }

    /// Execute a line, capturing both output streams.
    ///
    /// Stdin is empty. This is the embedding API; see [`Shell::run`] for
    /// terminal use.
    pub async fn exec(&mut self, line: &str) -> Result<ExecResult> {
        self.exec_with(line, ExecOptions::captured()).await
    }

    /// Execute a line with output going straight to the terminal.
    pub async fn run(&mut self, line: &str) -> Result<ExecResult> {
        self.exec_with(line, ExecOptions::terminal()).await
    }

    /// Execute an already parsed pipeline.
    pub async fn execute(&mut self, pipeline: &Pipeline, options: ExecOptions) -> Result<ExecResult> {
        self.interpreter.execute_pipeline(pipeline, options).await
    }

    async fn exec_with(&mut self, line: &str, options: ExecOptions) -> Result<ExecResult> {
        tracing::debug!(
            line = %format_line_for_log(line, self.interpreter.log_config()),
            "executing line"
        );
        let pipeline = parse(line)?;
        self.execute(&pipeline, options).await
    }

    /// Session environment.
    pub fn env(&self) -> &Environment {
        self.interpreter.env()
    }

    /// Session working directory.
    pub fn cwd(&self) -> &Path {
        self.interpreter.cwd()
    }
}

/// Builder for customized Shell configuration.
pub struct ShellBuilder {
    env: Vec<(String, String)>,
    inherit_process_env: bool,
    dotenv: Option<PathBuf>,
    load_dotenv: bool,
    cwd: Option<PathBuf>,
    limits: ExecutionLimits,
    log_config: LogConfig,
    builtins: Vec<(String, Box<dyn Builtin>)>,
}

impl Default for ShellBuilder {
    fn default() -> Self {
        Self {
            env: Vec::new(),
            inherit_process_env: true,
            dotenv: None,
            load_dotenv: true,
            cwd: None,
            limits: ExecutionLimits::default(),
            log_config: LogConfig::default(),
            builtins: Vec::new(),
        }
    }
}

impl ShellBuilder {
    /// Set an environment variable. Applied after the process environment
    /// and the dotenv file.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Start from the process environment (default: true).
    pub fn inherit_process_env(mut self, inherit: bool) -> Self {
        self.inherit_process_env = inherit;
        self
    }

    /// Load variables from this dotenv file instead of `<cwd>/.env`.
    pub fn dotenv(mut self, path: impl Into<PathBuf>) -> Self {
        self.dotenv = Some(path.into());
        self.load_dotenv = true;
        self
    }

    /// Skip dotenv loading.
    pub fn no_dotenv(mut self) -> Self {
        self.load_dotenv = false;
        self
    }

    /// Set the initial working directory.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set resource limits.
    pub fn limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Configure what may appear in logs.
    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Register a builtin, replacing any builtin with the same name.
    pub fn builtin(mut self, name: impl Into<String>, builtin: Box<dyn Builtin>) -> Self {
        self.builtins.push((name.into(), builtin));
        self
    }

    /// Build the Shell instance.
    pub fn build(self) -> Shell {
        let cwd = self
            .cwd
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));

        let mut env = if self.inherit_process_env {
            Environment::from_process()
        } else {
            Environment::new()
        };
        if self.load_dotenv {
            let path = self.dotenv.unwrap_or_else(|| cwd.join(".env"));
            let loaded = env.load_dotenv(&path);
            tracing::debug!(path = %path.display(), loaded, "dotenv loaded");
        }
        for (key, value) in self.env {
            env.set(key, value);
        }

        let mut interpreter = Interpreter::new(env, cwd);
        interpreter.set_limits(self.limits);
        interpreter.set_log_config(self.log_config);
        for (name, builtin) in self.builtins {
            interpreter.register_builtin(name, builtin);
        }

        Shell { interpreter }
    }
}
