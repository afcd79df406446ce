//! Generation engine seam.
//!
//! The pipeline hands the engine a space-joined, lexicographically sorted
//! candidate string and receives generated CSS plus per-token reports. The
//! built-in [`RuleEngine`] maps tokens through the configured rule table;
//! alternative engines implement [`GenerationEngine`].

mod rules;

pub use rules::RuleEngine;

/// Per-token feedback from a generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenReport {
    /// Token was intentionally skipped (empty or duplicate).
    Ignored,
    /// Token did not map to any generation rule.
    UnknownDirective(String),
}

/// Output of one generation pass.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    /// Generated stylesheet text.
    pub css: String,
    /// Number of CSS rules in the output.
    pub rule_count: usize,
    /// Per-token reports, including unknown directives.
    pub reports: Vec<TokenReport>,
}

/// A generation engine turns candidate tokens into stylesheet text.
///
/// Output accumulates across calls until [`reset`](Self::reset) clears it;
/// the pipeline resets once per generation cycle.
pub trait GenerationEngine: Send + Sync {
    /// Generate CSS for a space-joined candidate string.
    fn generate(&mut self, joined: &str) -> EngineOutput;

    /// Clear accumulated output.
    fn reset(&mut self);
}
