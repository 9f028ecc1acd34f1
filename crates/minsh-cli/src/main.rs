//! minsh CLI - line loop around the minsh library
//!
//! Usage:
//!   minsh -c 'echo hello'          # Execute a command line
//!   minsh script.sh                # Execute a file, one line at a time
//!   minsh                          # Interactive prompt (or lines from stdin)

#[cfg(feature = "interactive")]
mod interactive;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use minsh::{Error, ExecutionLimits, Shell};

/// Exit code for a line that does not parse.
const EXIT_SYNTAX: i32 = 2;

/// minsh - a minimal command shell
#[derive(Parser, Debug)]
#[command(name = "minsh")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Execute the given command line
    #[arg(short = 'c')]
    command: Option<String>,

    /// Script file to execute
    #[arg()]
    script: Option<PathBuf>,

    /// Load variables from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Do not load a dotenv file
    #[arg(long, conflicts_with = "env_file")]
    no_dotenv: bool,

    /// Kill external commands that run longer than this
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long)]
    debug: bool,
}

/// What the session should do after a line.
pub(crate) enum Flow {
    Continue(i32),
    Exit(i32),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let mut builder = Shell::builder();
    if let Some(path) = &args.env_file {
        builder = builder.dotenv(path);
    }
    if args.no_dotenv {
        builder = builder.no_dotenv();
    }
    if let Some(secs) = args.timeout {
        builder = builder.limits(ExecutionLimits::new().command_timeout(Duration::from_secs(secs)));
    }
    let mut shell = builder.build();

    // Execute command line if provided
    if let Some(cmd) = args.command {
        let code = match run_line(&mut shell, &cmd).await {
            Flow::Continue(code) | Flow::Exit(code) => code,
        };
        std::process::exit(code);
    }

    // Execute script file if provided
    if let Some(script_path) = args.script {
        let script = std::fs::read_to_string(&script_path)
            .with_context(|| format!("Failed to read script: {}", script_path.display()))?;
        let code = run_lines(&mut shell, script.lines().map(str::to_string)).await;
        std::process::exit(code);
    }

    if let Some(code) = interactive_session(&mut shell).await? {
        std::process::exit(code);
    }

    let lines = std::io::stdin()
        .lock()
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .context("Failed to read stdin")?;
    let code = run_lines(&mut shell, lines).await;
    std::process::exit(code);
}

/// Run the prompt when stdin is a terminal. `None` means stdin should be
/// read as a script instead.
#[cfg(feature = "interactive")]
async fn interactive_session(shell: &mut Shell) -> Result<Option<i32>> {
    use std::io::IsTerminal;

    if !std::io::stdin().is_terminal() {
        return Ok(None);
    }
    interactive::run(shell).await.map(Some)
}

#[cfg(not(feature = "interactive"))]
async fn interactive_session(_shell: &mut Shell) -> Result<Option<i32>> {
    Ok(None)
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--debug`.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Run lines in order until one of them calls `exit`.
///
/// Blank lines and `#` comment lines (a shebang, for instance) are skipped.
async fn run_lines(shell: &mut Shell, lines: impl IntoIterator<Item = String>) -> i32 {
    let mut status = 0;
    for line in lines {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match run_line(shell, &line).await {
            Flow::Continue(code) => status = code,
            Flow::Exit(code) => return code,
        }
    }
    status
}

/// Execute one line with terminal output, reporting failures on stderr.
pub(crate) async fn run_line(shell: &mut Shell, line: &str) -> Flow {
    match shell.run(line).await {
        Ok(result) => match result.exit_requested() {
            Some(code) => Flow::Exit(code),
            None => Flow::Continue(result.exit_code),
        },
        Err(e @ Error::Syntax { .. }) => {
            eprintln!("minsh: {}", e);
            Flow::Continue(EXIT_SYNTAX)
        }
        Err(e) => {
            tracing::debug!(error = %e, "line failed");
            eprintln!("minsh: {}", e);
            Flow::Continue(1)
        }
    }
}
