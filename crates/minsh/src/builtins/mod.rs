//! Built-in shell commands
//!
//! This module provides the [`Builtin`] trait for implementing commands that
//! run inside the shell process and the [`Context`] they run with.
//!
//! # Custom Builtins
//!
//! ```rust
//! use minsh::{Builtin, BuiltinContext, Completion, async_trait};
//!
//! struct Greet;
//!
//! #[async_trait]
//! impl Builtin for Greet {
//!     async fn execute(&self, mut ctx: BuiltinContext<'_>) -> minsh::Result<Completion> {
//!         let name = ctx.args.first().map(String::as_str).unwrap_or("world");
//!         ctx.io.write_stdout(format!("hello, {}\n", name))?;
//!         Ok(Completion::SUCCESS)
//!     }
//! }
//! ```
//!
//! Register via [`ShellBuilder::builtin`](crate::ShellBuilder::builtin).

mod echo;
mod environ;
mod export;
mod fileops;
mod flow;
mod ls;
mod navigation;
mod vars;

pub use echo::Echo;
pub use environ::Env;
pub use export::Export;
pub use fileops::{Mkdir, Rm, Touch};
pub use flow::{Exit, False, True};
pub use ls::Ls;
pub use navigation::{Cd, Pwd};
pub use vars::Unset;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::env::Environment;
use crate::error::Result;
use crate::interpreter::Io;

/// How a builtin finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Finished with an exit code
    Code(i32),
    /// Asked the session to end with an exit code (`exit`)
    ExitShell(i32),
}

impl Completion {
    /// Exit code 0.
    pub const SUCCESS: Completion = Completion::Code(0);
    /// Exit code 1.
    pub const FAILURE: Completion = Completion::Code(1);

    /// The exit code, whichever way the builtin finished.
    pub fn code(self) -> i32 {
        match self {
            Completion::Code(code) | Completion::ExitShell(code) => code,
        }
    }
}

/// Exit code for unrecognized options.
pub const EXIT_USAGE: i32 = 2;

/// Execution context for builtin commands.
pub struct Context<'a> {
    /// Command arguments (not including the command name).
    pub args: &'a [String],

    /// Session environment.
    ///
    /// Changes made here are seen by later commands and by spawned programs.
    pub env: &'a mut Environment,

    /// Session working directory (mutable, used by `cd`).
    pub cwd: &'a mut PathBuf,

    /// Output of the previous pipeline stage, or the contents of a `<`
    /// redirection. `None` for the first stage without redirection.
    pub stdin: Option<&'a [u8]>,

    /// Output streams, already bound to the terminal, a pipe buffer or a
    /// redirection file.
    pub io: Io<'a>,
}

/// Trait for implementing builtin commands.
///
/// Builtins report their own failures on `ctx.io` and return the exit code.
/// Returning `Err` is for failures the builtin cannot describe itself (such
/// as a broken output stream); the executor prints them as `<name>: <error>`
/// and uses exit code 1.
#[async_trait]
pub trait Builtin: Send + Sync {
    /// Execute the builtin command.
    async fn execute(&self, ctx: Context<'_>) -> Result<Completion>;
}

/// The builtin table every session starts with.
pub fn default_builtins() -> HashMap<&'static str, Box<dyn Builtin>> {
    let mut builtins: HashMap<&'static str, Box<dyn Builtin>> = HashMap::new();

    builtins.insert("cd", Box::new(Cd));
    builtins.insert("pwd", Box::new(Pwd));
    builtins.insert("ls", Box::new(Ls));
    builtins.insert("mkdir", Box::new(Mkdir));
    builtins.insert("rm", Box::new(Rm));
    builtins.insert("touch", Box::new(Touch));
    builtins.insert("echo", Box::new(Echo));
    builtins.insert("export", Box::new(Export));
    builtins.insert("unset", Box::new(Unset));
    builtins.insert("env", Box::new(Env));
    builtins.insert("exit", Box::new(Exit));
    builtins.insert("true", Box::new(True));
    builtins.insert("false", Box::new(False));

    builtins
}

/// Resolve a path relative to the current working directory.
///
/// Absolute paths are kept, relative ones are joined to `cwd`. Either way
/// `.` and `..` are folded lexically.
///
/// ```
/// use minsh::builtins::resolve_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(resolve_path(Path::new("/home"), "/etc/passwd"), PathBuf::from("/etc/passwd"));
/// assert_eq!(resolve_path(Path::new("/home"), "a/../b.txt"), PathBuf::from("/home/b.txt"));
/// ```
pub fn resolve_path(cwd: &Path, path_str: &str) -> PathBuf {
    let path = Path::new(path_str);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    normalize_path(&joined)
}

/// Fold `.` and `..` components without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::RootDir => result.push(Component::RootDir.as_os_str()),
            Component::Normal(name) => result.push(name),
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
        }
    }

    if result.as_os_str().is_empty() {
        result.push("/");
    }

    result
}

/// The user's home directory: `$HOME`, else the platform default.
pub(crate) fn home_dir(env: &Environment) -> Option<PathBuf> {
    env.get("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
}

/// Expand a leading `~` or `~/` to the home directory.
///
/// Other `~` forms (`~user`) are left alone.
pub(crate) fn expand_home(raw: &str, env: &Environment) -> String {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return raw.to_string(),
    };
    match home_dir(env) {
        Some(home) => format!("{}{}", home.display(), rest),
        None => raw.to_string(),
    }
}

/// Report unrecognized options as `<tool>: invalid option(s): ...`.
pub(crate) fn invalid_options(io: &mut Io<'_>, tool: &str, unknown: &[String]) -> Result<Completion> {
    io.write_stderr(format!("{}: invalid option(s): {}\n", tool, unknown.join(" ")))?;
    Ok(Completion::Code(EXIT_USAGE))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path_absolute() {
        let cwd = PathBuf::from("/home/user");
        let result = resolve_path(&cwd, "/tmp/file.txt");
        assert_eq!(result, PathBuf::from("/tmp/file.txt"));
    }

    #[test]
    fn test_resolve_path_relative() {
        let cwd = PathBuf::from("/home/user");
        let result = resolve_path(&cwd, "downloads/file.txt");
        assert_eq!(result, PathBuf::from("/home/user/downloads/file.txt"));
    }

    #[test]
    fn test_resolve_path_dotdot_from_root() {
        let cwd = PathBuf::from("/");
        assert_eq!(resolve_path(&cwd, ".."), PathBuf::from("/"));
        assert_eq!(resolve_path(&cwd, "."), PathBuf::from("/"));
    }

    #[test]
    fn test_resolve_path_complex() {
        let cwd = PathBuf::from("/home/user");
        let result = resolve_path(&cwd, "./downloads/../documents/./file.txt");
        assert_eq!(result, PathBuf::from("/home/user/documents/file.txt"));
    }

    #[test]
    fn test_expand_home() {
        let env: Environment = [("HOME", "/home/me")].into_iter().collect();
        assert_eq!(expand_home("~", &env), "/home/me");
        assert_eq!(expand_home("~/src", &env), "/home/me/src");
        assert_eq!(expand_home("~other/src", &env), "~other/src");
        assert_eq!(expand_home("a/~", &env), "a/~");
    }

    #[test]
    fn test_completion_code() {
        assert_eq!(Completion::SUCCESS.code(), 0);
        assert_eq!(Completion::ExitShell(3).code(), 3);
    }

    #[test]
    fn test_default_table() {
        let table = default_builtins();
        for name in [
            "cd", "ls", "mkdir", "rm", "touch", "echo", "export", "env", "unset", "pwd", "exit",
        ] {
            assert!(table.contains_key(name), "missing builtin {name}");
        }
    }
}
