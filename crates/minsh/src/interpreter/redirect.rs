//! Redirection resolution
//!
//! Targets are opened before a stage runs. Files are owned by the returned
//! [`StageFiles`] and closed when the stage is done with them.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::builtins::resolve_path;
use crate::error::{Error, Result};
use crate::parser::StreamRole;

/// An expanded redirection, ready to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRedirect {
    pub role: StreamRole,
    /// Target as written after expansion (used in messages)
    pub target: String,
    pub append: bool,
}

/// Files opened for one stage.
#[derive(Debug, Default)]
pub struct StageFiles {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
    pub stderr: Option<File>,
    /// Descriptors above 2: opened and kept alive, not connected
    pub held: Vec<(String, File)>,
}

/// Open every redirection of a stage, relative to `cwd`.
///
/// Stops at the first target that cannot be opened.
pub async fn open_all(cwd: &Path, redirects: &[ResolvedRedirect]) -> Result<StageFiles> {
    let mut files = StageFiles::default();

    for redirect in redirects {
        let path = resolve_path(cwd, &redirect.target);
        let file = open_target(&path, &redirect.role, redirect.append)
            .await
            .map_err(|source| Error::Redirect {
                path: PathBuf::from(&redirect.target),
                source,
            })?;
        tracing::debug!(
            role = %redirect.role,
            path = %path.display(),
            append = redirect.append,
            "opened redirection"
        );

        match &redirect.role {
            StreamRole::Stdin => files.stdin = Some(file),
            StreamRole::Stdout => files.stdout = Some(file),
            StreamRole::Stderr => files.stderr = Some(file),
            StreamRole::Fd(fd) => {
                tracing::warn!(fd = %fd, "descriptor redirection is opened but not connected");
                files.held.push((fd.clone(), file));
            }
        }
    }

    Ok(files)
}

async fn open_target(path: &Path, role: &StreamRole, append: bool) -> std::io::Result<File> {
    let file = match role {
        StreamRole::Stdin => tokio::fs::File::open(path).await?,
        _ => {
            tokio::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .append(append)
                .truncate(!append)
                .open(path)
                .await?
        }
    };
    Ok(file.into_std().await)
}
