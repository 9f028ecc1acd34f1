//! File operation builtins - mkdir, rm, touch

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

use super::{Builtin, Completion, Context, expand_home, invalid_options, resolve_path};
use crate::error::{Result, describe_io_error};

/// Split arguments into recognized flags, unknown flags and operands.
///
/// `--` ends flag parsing and a lone `-` is an operand. `on_flag` gets each
/// flag word (`--long`, or `-x` per letter of a short cluster) and returns
/// whether it was recognized.
fn parse_args<'a>(
    args: &'a [String],
    mut on_flag: impl FnMut(&str) -> bool,
) -> (Vec<&'a str>, Vec<String>) {
    let mut operands = Vec::new();
    let mut unknown = Vec::new();
    let mut flags_done = false;

    for arg in args {
        if flags_done || arg == "-" || !arg.starts_with('-') {
            operands.push(arg.as_str());
        } else if arg == "--" {
            flags_done = true;
        } else if arg.starts_with("--") {
            if !on_flag(arg) {
                unknown.push(arg.clone());
            }
        } else {
            for letter in arg[1..].chars() {
                let flag = format!("-{}", letter);
                if !on_flag(&flag) {
                    unknown.push(flag);
                }
            }
        }
    }

    (operands, unknown)
}

/// The mkdir builtin - create directories.
///
/// Usage: mkdir [-p] DIRECTORY...
///
/// Options:
///   -p, --parents   Create parent directories as needed, no error if existing
pub struct Mkdir;

#[async_trait]
impl Builtin for Mkdir {
    async fn execute(&self, mut ctx: Context<'_>) -> Result<Completion> {
        let mut parents = false;
        let (dirs, unknown) = parse_args(ctx.args, |flag| match flag {
            "-p" | "--parents" => {
                parents = true;
                true
            }
            _ => false,
        });

        if !unknown.is_empty() {
            return invalid_options(&mut ctx.io, "mkdir", &unknown);
        }
        if dirs.is_empty() {
            ctx.io.write_stderr("mkdir: missing operand\n")?;
            return Ok(Completion::FAILURE);
        }

        let mut status = Completion::SUCCESS;
        for dir in dirs {
            let path = resolve_path(ctx.cwd, &expand_home(dir, ctx.env));
            let created = if parents {
                tokio::fs::create_dir_all(&path).await
            } else {
                tokio::fs::create_dir(&path).await
            };

            if let Err(e) = created {
                ctx.io.write_stderr(format!(
                    "mkdir: cannot create directory '{}': {}\n",
                    dir,
                    describe_io_error(&e)
                ))?;
                status = Completion::FAILURE;
            }
        }

        Ok(status)
    }
}

/// The rm builtin - remove files or directories.
///
/// Usage: rm [-rRf] FILE...
///
/// Options:
///   -r, -R, --recursive   Remove directories and their contents
///   -f, --force           Ignore nonexistent files
pub struct Rm;

#[async_trait]
impl Builtin for Rm {
    async fn execute(&self, mut ctx: Context<'_>) -> Result<Completion> {
        let mut recursive = false;
        let mut force = false;
        let (targets, unknown) = parse_args(ctx.args, |flag| match flag {
            "-r" | "-R" | "--recursive" => {
                recursive = true;
                true
            }
            "-f" | "--force" => {
                force = true;
                true
            }
            _ => false,
        });

        if !unknown.is_empty() {
            return invalid_options(&mut ctx.io, "rm", &unknown);
        }
        if targets.is_empty() {
            ctx.io.write_stderr("rm: missing operand\n")?;
            return Ok(Completion::FAILURE);
        }

        let mut status = Completion::SUCCESS;
        for target in targets {
            let path = resolve_path(ctx.cwd, &expand_home(target, ctx.env));
            let reason = match remove(&path, recursive).await {
                Ok(()) => continue,
                Err(e) if force && e.kind() == ErrorKind::NotFound => continue,
                Err(e) => describe_io_error(&e),
            };
            ctx.io
                .write_stderr(format!("rm: cannot remove '{}': {}\n", target, reason))?;
            status = Completion::FAILURE;
        }

        Ok(status)
    }
}

async fn remove(path: &Path, recursive: bool) -> std::io::Result<()> {
    // Do not follow symlinks: removing a link to a directory removes the link
    let meta = tokio::fs::symlink_metadata(path).await?;
    if !meta.is_dir() {
        return tokio::fs::remove_file(path).await;
    }
    if !recursive {
        return Err(std::io::Error::from(ErrorKind::IsADirectory));
    }
    tokio::fs::remove_dir_all(path).await
}

/// The touch builtin - create files or update their modification time.
///
/// Usage: touch FILE...
pub struct Touch;

#[async_trait]
impl Builtin for Touch {
    async fn execute(&self, mut ctx: Context<'_>) -> Result<Completion> {
        let (files, unknown) = parse_args(ctx.args, |_| false);

        if !unknown.is_empty() {
            return invalid_options(&mut ctx.io, "touch", &unknown);
        }
        if files.is_empty() {
            ctx.io.write_stderr("touch: missing file operand\n")?;
            return Ok(Completion::FAILURE);
        }

        let mut status = Completion::SUCCESS;
        for file in files {
            let path = resolve_path(ctx.cwd, &expand_home(file, ctx.env));
            if let Err(e) = touch(&path).await {
                ctx.io.write_stderr(format!(
                    "touch: cannot touch '{}': {}\n",
                    file,
                    describe_io_error(&e)
                ))?;
                status = Completion::FAILURE;
            }
        }

        Ok(status)
    }
}

async fn touch(path: &Path) -> std::io::Result<()> {
    let is_dir = tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);

    let file = if is_dir {
        tokio::fs::File::open(path).await?
    } else {
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?
    };
    file.into_std().await.set_modified(SystemTime::now())
}
