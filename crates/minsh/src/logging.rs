//! Log hygiene for minsh
//!
//! The shell sees whole command lines and every variable in the session, and
//! both routinely carry credentials. Anything handed to `tracing` goes through
//! the helpers here first.
//!
//! Level usage:
//!
//! - **WARN**: ignored input (unreadable dotenv file, unwired descriptors)
//! - **DEBUG**: parsed lines, stage start/finish, spawns, redirections
//! - **TRACE**: tokens, variable expansion

use std::borrow::Cow;
use std::collections::HashSet;

const DEFAULT_SENSITIVE_NAMES: &[&str] = &[
    "PASSWORD",
    "PASSWD",
    "SECRET",
    "TOKEN",
    "KEY",
    "CREDENTIAL",
    "AUTH",
    "PRIVATE",
    "BEARER",
    "SESSION",
    "COOKIE",
    "DATABASE_URL",
    "CONNECTION_STRING",
];

/// Configuration for what the shell may write to its logs.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to redact sensitive data (default: true)
    pub redact_sensitive: bool,

    /// Variable name fragments whose values are always redacted
    /// (matched case-insensitively as substrings)
    pub redact_env_vars: HashSet<String>,

    /// Whether to log command lines verbatim (default: false)
    pub log_command_lines: bool,

    /// Maximum length of logged values before truncation (default: 200)
    pub max_value_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            redact_sensitive: true,
            redact_env_vars: DEFAULT_SENSITIVE_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            log_command_lines: false,
            max_value_length: 200,
        }
    }
}

impl LogConfig {
    /// Create a new log configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable redaction. Secrets in variables will reach the logs.
    pub fn unsafe_disable_redaction(mut self) -> Self {
        self.redact_sensitive = false;
        self
    }

    /// Add a variable name fragment to redact
    pub fn redact_env(mut self, pattern: &str) -> Self {
        self.redact_env_vars.insert(pattern.to_uppercase());
        self
    }

    /// Log command lines verbatim instead of as a size summary.
    pub fn unsafe_log_commands(mut self) -> Self {
        self.log_command_lines = true;
        self
    }

    /// Set maximum length for logged values
    pub fn max_value_length(mut self, len: usize) -> Self {
        self.max_value_length = len;
        self
    }

    /// Check if a variable's value must be hidden based on its name
    pub fn should_redact_env(&self, name: &str) -> bool {
        if !self.redact_sensitive {
            return false;
        }
        let upper = name.to_uppercase();
        self.redact_env_vars
            .iter()
            .any(|pattern| upper.contains(pattern.as_str()))
    }

    /// Redact a value if it looks like a credential, truncate otherwise
    pub fn redact_value<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if self.redact_sensitive && looks_sensitive(value) {
            return Cow::Borrowed("[REDACTED]");
        }
        self.truncate(value)
    }

    /// Redact a variable value by name first, then by content
    pub fn redact_var<'a>(&self, name: &str, value: &'a str) -> Cow<'a, str> {
        if self.should_redact_env(name) {
            return Cow::Borrowed("[REDACTED]");
        }
        self.redact_value(value)
    }

    /// Truncate on a char boundary at or before `max_value_length`
    fn truncate<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if value.len() <= self.max_value_length {
            return Cow::Borrowed(value);
        }
        let mut end = self.max_value_length;
        while end > 0 && !value.is_char_boundary(end) {
            end -= 1;
        }
        Cow::Owned(format!(
            "{}...[truncated {} bytes]",
            &value[..end],
            value.len() - end
        ))
    }
}

fn looks_sensitive(value: &str) -> bool {
    let lower = value.to_lowercase();
    if lower.contains("password")
        || lower.contains("secret")
        || lower.contains("bearer ")
        || lower.contains("basic ")
    {
        return true;
    }

    let trimmed = value.trim();
    let prefixes = [
        "sk-", "sk_live_", "sk_test_", "ghp_", "gho_", "ghs_", "xoxb-", "xoxp-", "AKIA", "eyJ",
    ];
    if prefixes
        .iter()
        .any(|p| trimmed.starts_with(p) && trimmed.len() > p.len() + 10)
    {
        return true;
    }

    trimmed.len() >= 32 && is_high_entropy(trimmed)
}

/// Many distinct characters in a long token usually means random key material
fn is_high_entropy(s: &str) -> bool {
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return false;
    }
    let unique: HashSet<char> = s.chars().collect();
    unique.len() > 15 && unique.len() as f64 / s.len() as f64 > 0.5
}

/// Escape line breaks and drop other control characters so logged text
/// cannot forge extra log records.
pub fn sanitize_for_log(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Format a command line for logging according to `config`.
pub fn format_line_for_log(line: &str, config: &LogConfig) -> String {
    if !config.log_command_lines {
        let words = line.split_whitespace().count();
        return format!("[line: {} words, {} bytes]", words, line.len());
    }
    config.truncate(&sanitize_for_log(line)).into_owned()
}
