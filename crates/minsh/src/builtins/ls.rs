//! Directory listing builtin - ls

use async_trait::async_trait;
use chrono::{DateTime, Local};
use colored::Colorize;
use std::cmp::Ordering;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{Builtin, Completion, Context, expand_home, invalid_options, resolve_path};
use crate::error::{Result, describe_io_error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SortKey {
    #[default]
    Name,
    Size,
    Time,
}

/// Options for ls command
#[derive(Debug, Default)]
struct LsOptions {
    all: bool,
    long: bool,
    human: bool,
    recursive: bool,
    classify: bool,
    sort: SortKey,
}

/// The ls builtin - list directory contents.
///
/// Usage: ls [-alhRStF] [--all] [PATH...]
///
/// Options:
///   -a, --all  Show entries starting with `.`
///   -l         Long format: mode, size, modification time, name
///   -h         Human-readable sizes (with -l)
///   -R         List subdirectories recursively
///   -S         Sort by size, largest first
///   -t         Sort by modification time, newest first
///   -F         Append `/` to directories and `*` to executables
///
/// Directories are colored when stdout is a terminal.
pub struct Ls;

#[async_trait]
impl Builtin for Ls {
    async fn execute(&self, mut ctx: Context<'_>) -> Result<Completion> {
        let mut opts = LsOptions::default();
        let mut targets: Vec<&str> = Vec::new();
        let mut unknown = Vec::new();
        let mut flags_done = false;

        for arg in ctx.args {
            if flags_done || arg == "-" || !arg.starts_with('-') {
                targets.push(arg);
            } else if arg == "--" {
                flags_done = true;
            } else if arg == "--all" {
                opts.all = true;
            } else if arg.starts_with("--") {
                unknown.push(arg.clone());
            } else {
                for c in arg[1..].chars() {
                    match c {
                        'a' => opts.all = true,
                        'l' => opts.long = true,
                        'h' => opts.human = true,
                        'R' => opts.recursive = true,
                        'S' => opts.sort = SortKey::Size,
                        't' => opts.sort = SortKey::Time,
                        'F' => opts.classify = true,
                        other => unknown.push(format!("-{}", other)),
                    }
                }
            }
        }

        if !unknown.is_empty() {
            return invalid_options(&mut ctx.io, "ls", &unknown);
        }

        if targets.is_empty() {
            targets.push(".");
        }

        let mut listing = Listing {
            opts,
            color: ctx.io.stdout_is_tty(),
            multiple: targets.len() > 1,
            out: String::new(),
            err: String::new(),
            failed: false,
        };

        for (i, raw) in targets.iter().enumerate() {
            let path = resolve_path(ctx.cwd, &expand_home(raw, ctx.env));
            match tokio::fs::symlink_metadata(&path).await {
                Ok(meta) if meta.is_dir() => listing.directory_tree(path, raw).await,
                Ok(meta) => {
                    if listing.multiple {
                        listing.out.push_str(&format!("{}:\n", raw));
                    }
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| raw.to_string());
                    listing.entry(&Entry { name, meta: Some(meta) });
                }
                Err(e) => {
                    listing.err.push_str(&format!(
                        "ls: cannot access '{}': {}\n",
                        raw,
                        describe_io_error(&e)
                    ));
                    listing.failed = true;
                    continue;
                }
            }
            if listing.multiple && i + 1 < targets.len() {
                listing.out.push('\n');
            }
        }

        ctx.io.write_stdout(&listing.out)?;
        if !listing.err.is_empty() {
            ctx.io.write_stderr(&listing.err)?;
        }

        Ok(if listing.failed {
            Completion::FAILURE
        } else {
            Completion::SUCCESS
        })
    }
}

struct Entry {
    name: String,
    /// `None` when the entry vanished or could not be stat'ed
    meta: Option<Metadata>,
}

impl Entry {
    fn is_dir(&self) -> bool {
        self.meta.as_ref().is_some_and(Metadata::is_dir)
    }

    fn size(&self) -> u64 {
        self.meta.as_ref().map_or(0, Metadata::len)
    }

    fn modified(&self) -> Option<SystemTime> {
        self.meta.as_ref().and_then(|m| m.modified().ok())
    }
}

/// Accumulated output of one ls invocation.
struct Listing {
    opts: LsOptions,
    color: bool,
    multiple: bool,
    out: String,
    err: String,
    failed: bool,
}

impl Listing {
    /// List `root` and, with -R, every directory below it (pre-order).
    async fn directory_tree(&mut self, root: PathBuf, display: &str) {
        let mut pending = vec![(root, display.to_string(), 0usize)];

        while let Some((path, display, depth)) = pending.pop() {
            if depth > 0 {
                self.out.push('\n');
            }
            if self.multiple || depth > 0 {
                self.out.push_str(&format!("{}:\n", display));
            }

            let entries = match self.read_entries(&path).await {
                Ok(entries) => entries,
                Err(e) => {
                    self.err.push_str(&format!(
                        "ls: cannot open directory '{}': {}\n",
                        display,
                        describe_io_error(&e)
                    ));
                    self.failed = true;
                    continue;
                }
            };

            self.entries(&entries);

            if self.opts.recursive {
                // Reverse so the first subdirectory is listed first
                for entry in entries.iter().rev().filter(|e| e.is_dir()) {
                    let sub_display = if display == "." {
                        format!("./{}", entry.name)
                    } else {
                        format!("{}/{}", display.trim_end_matches('/'), entry.name)
                    };
                    pending.push((path.join(&entry.name), sub_display, depth + 1));
                }
            }
        }
    }

    async fn read_entries(&self, dir: &Path) -> std::io::Result<Vec<Entry>> {
        let mut reader = tokio::fs::read_dir(dir).await?;
        let mut entries = Vec::new();

        while let Some(dirent) = reader.next_entry().await? {
            let name = dirent.file_name().to_string_lossy().into_owned();
            if !self.opts.all && name.starts_with('.') {
                continue;
            }
            let meta = tokio::fs::symlink_metadata(dirent.path()).await.ok();
            entries.push(Entry { name, meta });
        }

        entries.sort_by(|a, b| match self.opts.sort {
            SortKey::Name => by_name(a, b),
            SortKey::Size => b.size().cmp(&a.size()).then_with(|| by_name(a, b)),
            SortKey::Time => b.modified().cmp(&a.modified()).then_with(|| by_name(a, b)),
        });
        Ok(entries)
    }

    fn entries(&mut self, entries: &[Entry]) {
        if !self.opts.long {
            for entry in entries {
                let name = self.decorate(entry);
                self.out.push_str(&name);
                self.out.push('\n');
            }
            return;
        }

        let sizes: Vec<String> = entries.iter().map(|e| self.size(e.size())).collect();
        let width = sizes.iter().map(String::len).max().unwrap_or(1);
        for (entry, size) in entries.iter().zip(&sizes) {
            let line = format!(
                "{} {:>width$} {} {}\n",
                format_mode(entry.meta.as_ref()),
                size,
                format_mtime(entry.modified()),
                self.decorate(entry),
                width = width
            );
            self.out.push_str(&line);
        }
    }

    fn entry(&mut self, entry: &Entry) {
        if self.opts.long {
            let line = format!(
                "{} {} {} {}\n",
                format_mode(entry.meta.as_ref()),
                self.size(entry.size()),
                format_mtime(entry.modified()),
                self.decorate(entry)
            );
            self.out.push_str(&line);
        } else {
            let name = self.decorate(entry);
            self.out.push_str(&name);
            self.out.push('\n');
        }
    }

    fn size(&self, bytes: u64) -> String {
        if self.opts.human {
            human_readable_size(bytes)
        } else {
            bytes.to_string()
        }
    }

    fn decorate(&self, entry: &Entry) -> String {
        let is_dir = entry.is_dir();
        let suffix = match (self.opts.classify, is_dir) {
            (false, _) => "",
            (true, true) => "/",
            (true, false) if is_executable(entry.meta.as_ref()) => "*",
            (true, false) => "",
        };
        let name = format!("{}{}", entry.name, suffix);
        if self.color && is_dir {
            name.bright_green().to_string()
        } else {
            name
        }
    }
}

/// Case-insensitive name order, ties broken by exact bytes.
fn by_name(a: &Entry, b: &Entry) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

fn format_mtime(time: Option<SystemTime>) -> String {
    match time {
        Some(time) => DateTime::<Local>::from(time)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "????-??-?? ??:??".to_string(),
    }
}

fn format_mode(meta: Option<&Metadata>) -> String {
    let Some(meta) = meta else {
        return "??????????".to_string();
    };
    let file_type = if meta.is_dir() {
        'd'
    } else if meta.file_type().is_symlink() {
        'l'
    } else {
        '-'
    };

    let mode = permission_bits(meta);
    let mut out = String::with_capacity(10);
    out.push(file_type);
    for (bit, c) in [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ] {
        out.push(if mode & bit != 0 { c } else { '-' });
    }
    out
}

#[cfg(unix)]
fn permission_bits(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn permission_bits(meta: &Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

fn is_executable(meta: Option<&Metadata>) -> bool {
    match meta {
        Some(meta) if !meta.is_dir() => permission_bits(meta) & 0o111 != 0,
        _ => false,
    }
}

fn human_readable_size(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["B", "K", "M", "G", "T", "P", "E"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{}B", bytes)
    } else if value >= 10.0 {
        format!("{:.0}{}", value, UNITS[unit])
    } else {
        format!("{:.1}{}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::TestRun;
    use pretty_assertions::assert_eq;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "bb").unwrap();
        std::fs::write(dir.path().join("A.txt"), "aaaaa").unwrap();
        std::fs::write(dir.path().join(".hidden"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/inner.txt"), "i").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_ls_default() {
        let dir = fixture();
        let mut run = TestRun::new(dir.path());
        assert_eq!(run.run(&Ls, &[]).await, Completion::SUCCESS);
        assert_eq!(run.stdout(), "A.txt\nb.txt\nsub\n");
    }

    #[tokio::test]
    async fn test_ls_all() {
        let dir = fixture();
        let mut run = TestRun::new(dir.path());
        run.run(&Ls, &["--all"]).await;
        assert_eq!(run.stdout(), ".hidden\nA.txt\nb.txt\nsub\n");
        run.run(&Ls, &["-a"]).await;
        assert_eq!(run.stdout(), ".hidden\nA.txt\nb.txt\nsub\n");
    }

    #[tokio::test]
    async fn test_ls_classify_and_size_sort() {
        let dir = fixture();
        let mut run = TestRun::new(dir.path());
        run.run(&Ls, &["-F"]).await;
        assert_eq!(run.stdout(), "A.txt\nb.txt\nsub/\n");

        std::fs::remove_dir_all(dir.path().join("sub")).unwrap();
        run.run(&Ls, &["-S"]).await;
        assert_eq!(run.stdout(), "A.txt\nb.txt\n");
    }

    #[tokio::test]
    async fn test_ls_recursive() {
        let dir = fixture();
        let mut run = TestRun::new(dir.path());
        run.run(&Ls, &["-R"]).await;
        assert_eq!(run.stdout(), "A.txt\nb.txt\nsub\n\n./sub:\ninner.txt\n");
    }

    #[tokio::test]
    async fn test_ls_long_format() {
        let dir = fixture();
        let mut run = TestRun::new(dir.path());
        run.run(&Ls, &["-l", "A.txt"]).await;
        let out = run.stdout();
        assert!(out.starts_with('-'), "unexpected: {out}");
        assert!(out.contains(" 5 "), "unexpected: {out}");
        assert!(out.ends_with(" A.txt\n"), "unexpected: {out}");
    }

    #[tokio::test]
    async fn test_ls_multiple_targets() {
        let dir = fixture();
        let mut run = TestRun::new(dir.path());
        run.run(&Ls, &["sub", "b.txt"]).await;
        assert_eq!(run.stdout(), "sub:\ninner.txt\n\nb.txt:\nb.txt\n");
    }

    #[tokio::test]
    async fn test_ls_missing_target() {
        let dir = fixture();
        let mut run = TestRun::new(dir.path());
        assert_eq!(run.run(&Ls, &["nope", "b.txt"]).await, Completion::FAILURE);
        assert_eq!(
            run.stderr(),
            "ls: cannot access 'nope': No such file or directory\n"
        );
        assert_eq!(run.stdout(), "b.txt:\nb.txt\n");
    }

    #[tokio::test]
    async fn test_ls_invalid_option() {
        let dir = fixture();
        let mut run = TestRun::new(dir.path());
        assert_eq!(run.run(&Ls, &["-lz", "--color"]).await, Completion::Code(2));
        assert_eq!(run.stderr(), "ls: invalid option(s): -z --color\n");
    }

    #[test]
    fn test_human_readable_size() {
        assert_eq!(human_readable_size(0), "0B");
        assert_eq!(human_readable_size(1023), "1023B");
        assert_eq!(human_readable_size(1536), "1.5K");
        assert_eq!(human_readable_size(20 * 1024 * 1024), "20M");
    }
}
