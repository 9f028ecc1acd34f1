//! External command execution

use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;

use super::io::Sink;
use crate::env::Environment;
use crate::error::{Result, describe_io_error};

/// Exit code when a program cannot be started.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit code when a program is killed for running too long.
pub const EXIT_TIMEOUT: i32 = 124;

/// Where an external command reads its input from.
#[derive(Debug)]
pub enum StdinSource {
    /// The shell's own stdin
    Inherit,
    /// Nothing (immediate end of file)
    Null,
    /// Output of the previous stage
    Bytes(Vec<u8>),
    /// A `<` redirection
    File(File),
}

/// A program invocation with its expanded words.
pub struct ExternalCommand<'a> {
    pub name: &'a str,
    pub args: &'a [String],
    pub env: &'a Environment,
    pub cwd: &'a Path,
    pub timeout: Option<Duration>,
}

impl ExternalCommand<'_> {
    /// Spawn the program and wait for it.
    ///
    /// Output is written to `stdout`/`stderr`. Start failures and timeouts
    /// are reported on `stderr` and turned into exit codes.
    pub async fn run(&self, stdin: StdinSource, stdout: &mut Sink, stderr: &mut Sink) -> Result<i32> {
        let mut cmd = tokio::process::Command::new(self.name);
        cmd.args(self.args)
            .env_clear()
            .envs(self.env.iter())
            .current_dir(self.cwd)
            .stdout(stdout.to_stdio()?)
            .stderr(stderr.to_stdio()?)
            .kill_on_drop(true);

        let input = match stdin {
            StdinSource::Inherit => {
                cmd.stdin(Stdio::inherit());
                None
            }
            StdinSource::Null => {
                cmd.stdin(Stdio::null());
                None
            }
            StdinSource::File(file) => {
                cmd.stdin(Stdio::from(file));
                None
            }
            StdinSource::Bytes(bytes) => {
                cmd.stdin(Stdio::piped());
                Some(bytes)
            }
        };

        tracing::debug!(program = self.name, args = self.args.len(), "spawning");
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let reason = if e.kind() == std::io::ErrorKind::NotFound {
                    "command not found".to_string()
                } else {
                    describe_io_error(&e)
                };
                tracing::debug!(program = self.name, error = %e, "spawn failed");
                stderr.write_all(format!("minsh: {}: {}\n", self.name, reason).as_bytes())?;
                return Ok(EXIT_NOT_FOUND);
            }
        };

        let pipe = child.stdin.take();
        let feed = async move {
            if let (Some(mut pipe), Some(bytes)) = (pipe, input) {
                // The child may exit without reading its input
                if let Err(e) = pipe.write_all(&bytes).await {
                    tracing::trace!(error = %e, "stdin feed ended early");
                }
            }
        };
        let run = async move {
            let (_, output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(output) => output?,
                Err(_) => {
                    // Dropping the future drops the child, which kills it
                    tracing::debug!(program = self.name, ?limit, "killed after timeout");
                    stderr.write_all(format!("minsh: {}: timed out\n", self.name).as_bytes())?;
                    return Ok(EXIT_TIMEOUT);
                }
            },
            None => run.await?,
        };

        if !output.stdout.is_empty() {
            stdout.write_all(&output.stdout)?;
        }
        if !output.stderr.is_empty() {
            stderr.write_all(&output.stderr)?;
        }

        // Killed by a signal: no code
        let code = output.status.code().unwrap_or(1);
        tracing::debug!(program = self.name, code, "exited");
        Ok(code)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn env_with_path() -> Environment {
        let mut env = Environment::new();
        if let Ok(path) = std::env::var("PATH") {
            env.set("PATH", path);
        }
        env
    }

    #[tokio::test]
    async fn test_missing_program_is_127() {
        let env = env_with_path();
        let dir = tempfile::tempdir().unwrap();
        let cmd = ExternalCommand {
            name: "definitely-not-a-real-program-xyz",
            args: &[],
            env: &env,
            cwd: dir.path(),
            timeout: None,
        };
        let mut out = Sink::buffer();
        let mut err = Sink::buffer();
        let code = cmd.run(StdinSource::Null, &mut out, &mut err).await.unwrap();
        assert_eq!(code, EXIT_NOT_FOUND);
        assert_eq!(
            String::from_utf8(err.take_buffer()).unwrap(),
            "minsh: definitely-not-a-real-program-xyz: command not found\n"
        );
    }

    #[tokio::test]
    async fn test_stdin_bytes_are_fed() {
        let env = env_with_path();
        let dir = tempfile::tempdir().unwrap();
        let cmd = ExternalCommand {
            name: "cat",
            args: &[],
            env: &env,
            cwd: dir.path(),
            timeout: None,
        };
        let mut out = Sink::buffer();
        let mut err = Sink::buffer();
        let code = cmd
            .run(StdinSource::Bytes(b"piped\n".to_vec()), &mut out, &mut err)
            .await
            .unwrap();
        assert_eq!(code, 0);
        assert_eq!(out.take_buffer(), b"piped\n");
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let env = env_with_path();
        let dir = tempfile::tempdir().unwrap();
        let args = vec!["5".to_string()];
        let cmd = ExternalCommand {
            name: "sleep",
            args: &args,
            env: &env,
            cwd: dir.path(),
            timeout: Some(Duration::from_millis(100)),
        };
        let mut out = Sink::buffer();
        let mut err = Sink::buffer();
        let code = cmd.run(StdinSource::Null, &mut out, &mut err).await.unwrap();
        assert_eq!(code, EXIT_TIMEOUT);
        assert_eq!(
            String::from_utf8(err.take_buffer()).unwrap(),
            "minsh: sleep: timed out\n"
        );
    }
}
