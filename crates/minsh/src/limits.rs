//! Resource limits for command execution
//!
//! Command substitution nests whole pipelines, so its depth is capped.
//! External commands can optionally be given a wall-clock timeout.

use std::time::Duration;

/// Resource limits for pipeline execution
#[derive(Debug, Clone)]
pub struct ExecutionLimits {
    /// Maximum nesting of `$(...)` evaluated at runtime
    /// Default: 64
    pub max_substitution_depth: usize,

    /// Wall-clock limit for each external command
    /// Default: none
    pub command_timeout: Option<Duration>,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_substitution_depth: 64,
            command_timeout: None,
        }
    }
}

impl ExecutionLimits {
    /// Create new limits with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum substitution depth
    pub fn max_substitution_depth(mut self, depth: usize) -> Self {
        self.max_substitution_depth = depth;
        self
    }

    /// Set the per-command timeout for external programs
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }
}

/// Tracks how deep the executor currently is inside command substitutions.
#[derive(Debug, Clone, Default)]
pub struct ExecutionCounters {
    /// Current substitution depth
    pub substitution_depth: usize,
}

impl ExecutionCounters {
    /// Enter a command substitution, returns error if depth exceeded
    pub fn push_substitution(&mut self, limits: &ExecutionLimits) -> Result<(), LimitExceeded> {
        // Check before incrementing so a failure leaves the depth untouched
        if self.substitution_depth >= limits.max_substitution_depth {
            return Err(LimitExceeded::MaxSubstitutionDepth(
                limits.max_substitution_depth,
            ));
        }
        self.substitution_depth += 1;
        Ok(())
    }

    /// Leave a command substitution
    pub fn pop_substitution(&mut self) {
        self.substitution_depth = self.substitution_depth.saturating_sub(1);
    }
}

/// Error returned when a resource limit is exceeded
#[derive(Debug, Clone, thiserror::Error)]
pub enum LimitExceeded {
    #[error("maximum command substitution depth exceeded ({0})")]
    MaxSubstitutionDepth(usize),

    #[error("command timed out ({0:?})")]
    Timeout(Duration),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = ExecutionLimits::default();
        assert_eq!(limits.max_substitution_depth, 64);
        assert_eq!(limits.command_timeout, None);
    }

    #[test]
    fn test_builder_pattern() {
        let limits = ExecutionLimits::new()
            .max_substitution_depth(4)
            .command_timeout(Duration::from_secs(5));

        assert_eq!(limits.max_substitution_depth, 4);
        assert_eq!(limits.command_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_substitution_depth() {
        let limits = ExecutionLimits::new().max_substitution_depth(2);
        let mut counters = ExecutionCounters::default();

        assert!(counters.push_substitution(&limits).is_ok());
        assert!(counters.push_substitution(&limits).is_ok());

        // 3rd level should fail without moving the counter
        assert!(matches!(
            counters.push_substitution(&limits),
            Err(LimitExceeded::MaxSubstitutionDepth(2))
        ));
        assert_eq!(counters.substitution_depth, 2);

        counters.pop_substitution();
        assert!(counters.push_substitution(&limits).is_ok());
    }

    #[test]
    fn test_pop_saturates() {
        let mut counters = ExecutionCounters::default();
        counters.pop_substitution();
        assert_eq!(counters.substitution_depth, 0);
    }
}
