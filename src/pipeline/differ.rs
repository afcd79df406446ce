//! Candidate set diffing.

use std::collections::HashSet;

/// Order-independent set equality check between two candidate sets.
#[must_use]
pub fn sets_differ(previous: &HashSet<String>, next: &HashSet<String>) -> bool {
    previous.len() != next.len() || !next.iter().all(|token| previous.contains(token))
}

/// Outcome of comparing a cycle's candidates against the previous cycle.
#[derive(Debug, Clone, Copy)]
pub struct RebuildDecision {
    /// Rebuild forced by a config reload, a deletion, or an early
    /// new-token signal, even when the sets are identical.
    pub forced: bool,
    /// The candidate sets are not equal.
    pub sets_differ: bool,
}

impl RebuildDecision {
    /// Whether the cycle proceeds to generation.
    #[must_use]
    pub fn should_generate(&self) -> bool {
        self.forced || self.sets_differ
    }
}
