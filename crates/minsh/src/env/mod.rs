//! Session environment
//!
//! One [`Environment`] lives for the whole session. It starts from the
//! process environment plus an optional dotenv file, is changed by
//! `export`/`unset`, and is what external commands receive.

pub mod dotenv;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Variables of a shell session and where they came from.
///
/// Provenance only affects how `env` displays a variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Variable values, kept sorted by name
    pub vars: BTreeMap<String, String>,
    /// Names whose current value was loaded from a dotenv file
    pub from_dotenv: BTreeSet<String>,
    /// Names set or marked by `export` during the session
    pub from_export: BTreeSet<String>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment.
    ///
    /// Entries that are not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self {
            vars,
            ..Self::default()
        }
    }

    /// Merge the variables of a dotenv file, overriding existing values.
    ///
    /// Returns how many assignments were applied. A missing file applies none.
    pub fn load_dotenv(&mut self, path: &Path) -> usize {
        let assignments = dotenv::load(path);
        let count = assignments.len();
        for (key, value) in assignments {
            self.from_dotenv.insert(key.clone());
            self.vars.insert(key, value);
        }
        count
    }

    /// Get a variable's value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Check if a variable is set.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Set a variable without recording provenance.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Export a variable.
    ///
    /// With a value the variable is overwritten. Without one it is created
    /// empty if missing and left alone otherwise.
    pub fn export(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.vars.insert(name.to_string(), value.to_string());
            }
            None => {
                self.vars.entry(name.to_string()).or_default();
            }
        }
        self.from_export.insert(name.to_string());
    }

    /// Remove a variable and its provenance. Returns whether it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.from_export.remove(name);
        self.from_dotenv.remove(name);
        self.vars.remove(name).is_some()
    }

    /// Whether the variable was exported during this session.
    pub fn is_exported(&self, name: &str) -> bool {
        self.from_export.contains(name)
    }

    /// Whether the variable's value came from a dotenv file.
    pub fn is_from_dotenv(&self, name: &str) -> bool {
        self.from_dotenv.contains(name)
    }

    /// Iterate variables sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variables are set.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }
}
