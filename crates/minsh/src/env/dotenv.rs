//! `.env` file loading
//!
//! Accepted syntax, one assignment per line:
//!
//! ```text
//! # comment
//! PLAIN=value # trailing comment
//! export QUOTED="line one\nline two"
//! LITERAL='no $escapes \n here'
//! ```

use std::path::Path;

/// Parse dotenv content into assignments, in file order.
///
/// Lines without `=` or with an invalid key are skipped.
pub fn parse(content: &str) -> Vec<(String, String)> {
    let mut vars = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = match line.strip_prefix("export ") {
            Some(rest) => rest.trim_start(),
            None => line,
        };
        let Some((key, raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if !is_dotenv_key(key) {
            continue;
        }

        vars.push((key.to_string(), parse_value(raw)));
    }

    vars
}

/// Read and parse a dotenv file.
///
/// A missing file yields no variables. Any other read failure is logged and
/// also yields no variables.
pub fn load(path: &Path) -> Vec<(String, String)> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let vars = parse(&content);
            tracing::debug!(path = %path.display(), count = vars.len(), "loaded dotenv file");
            vars
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable dotenv file");
            Vec::new()
        }
    }
}

/// Keys may use either case: `[A-Za-z_][A-Za-z0-9_]*`
fn is_dotenv_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_value(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(quote @ ('"' | '\'')) = trimmed.chars().next()
        && let Some(value) = parse_quoted(&trimmed[1..], quote)
    {
        return value;
    }

    // Unquoted (or unbalanced quote): strip a comment that starts a word
    let mut prev_ws = true;
    for (i, c) in trimmed.char_indices() {
        if c == '#' && prev_ws {
            return trimmed[..i].trim_end().to_string();
        }
        prev_ws = c.is_whitespace();
    }
    trimmed.to_string()
}

/// Read up to the closing quote. `None` when the quote is never closed.
fn parse_quoted(body: &str, quote: char) -> Option<String> {
    let mut out = String::new();
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c == quote {
            return Some(out);
        }
        if quote == '"' && c == '\\' {
            match chars.next()? {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                other => out.push(other),
            }
            continue;
        }
        out.push(c);
    }

    None
}
