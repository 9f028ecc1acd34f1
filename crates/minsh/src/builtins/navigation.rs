//! Navigation builtins (cd, pwd)

use async_trait::async_trait;
use std::io::ErrorKind;

use super::{Builtin, Completion, Context, expand_home, home_dir, resolve_path};
use crate::error::{Result, describe_io_error};

/// The cd builtin - change the session's working directory.
///
/// Usage: cd [DIR]
///
/// Without DIR, goes to `$HOME`. A leading `~` expands to the home directory.
pub struct Cd;

#[async_trait]
impl Builtin for Cd {
    async fn execute(&self, mut ctx: Context<'_>) -> Result<Completion> {
        let (display, target) = match ctx.args.first() {
            Some(raw) => (raw.clone(), expand_home(raw, ctx.env)),
            None => match home_dir(ctx.env) {
                Some(home) => {
                    let home = home.display().to_string();
                    (home.clone(), home)
                }
                None => {
                    ctx.io.write_stderr("cd: HOME not set\n")?;
                    return Ok(Completion::FAILURE);
                }
            },
        };

        let path = resolve_path(ctx.cwd, &target);
        let message = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => {
                tracing::debug!(from = %ctx.cwd.display(), to = %path.display(), "changing directory");
                *ctx.cwd = path;
                return Ok(Completion::SUCCESS);
            }
            Ok(_) => format!("cd: not a directory: {}\n", display),
            Err(e) => match e.kind() {
                ErrorKind::NotFound => format!("cd: no such file or directory: {}\n", display),
                ErrorKind::PermissionDenied => format!("cd: permission denied: {}\n", display),
                ErrorKind::NotADirectory => format!("cd: not a directory: {}\n", display),
                _ => format!("cd: {}: {}\n", display, describe_io_error(&e)),
            },
        };

        ctx.io.write_stderr(message)?;
        Ok(Completion::FAILURE)
    }
}

/// The pwd builtin - print working directory.
pub struct Pwd;

#[async_trait]
impl Builtin for Pwd {
    async fn execute(&self, mut ctx: Context<'_>) -> Result<Completion> {
        let line = format!("{}\n", ctx.cwd.display());
        ctx.io.write_stdout(line)?;
        Ok(Completion::SUCCESS)
    }
}
