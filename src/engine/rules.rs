//! Rule-table generation engine.

use std::collections::{BTreeMap, HashSet};

use crate::config::ProjectConfig;

use super::{EngineOutput, GenerationEngine, TokenReport};

/// Generation engine driven by the configuration's `[rules]` table.
///
/// Each directive in the candidate string that matches a configured class
/// name emits a `.name{declarations}` rule; unmatched directives are
/// reported as unknown. The configured base CSS is always emitted first,
/// so an empty candidate set still produces a well-formed stylesheet.
pub struct RuleEngine {
    base: String,
    rules: BTreeMap<String, String>,
    target: Vec<String>,
    emitted: HashSet<String>,
}

impl RuleEngine {
    /// Build an engine from project configuration.
    #[must_use]
    pub fn new(config: &ProjectConfig) -> Self {
        Self {
            base: config.base.clone(),
            rules: config.rules.clone(),
            target: Vec::new(),
            emitted: HashSet::new(),
        }
    }

    fn stylesheet(&self) -> String {
        if self.base.is_empty() {
            self.target.join("")
        } else {
            let mut css = self.base.clone();
            css.push_str(&self.target.join(""));
            css
        }
    }
}

impl GenerationEngine for RuleEngine {
    fn generate(&mut self, joined: &str) -> EngineOutput {
        let mut reports = Vec::new();

        for directive in joined.split_whitespace() {
            if self.emitted.contains(directive) {
                reports.push(TokenReport::Ignored);
                continue;
            }
            match self.rules.get(directive) {
                Some(declarations) => {
                    self.target
                        .push(format!(".{directive}{{{declarations}}}"));
                    self.emitted.insert(directive.to_string());
                }
                None => {
                    reports.push(TokenReport::UnknownDirective(directive.to_string()));
                }
            }
        }

        EngineOutput {
            css: self.stylesheet(),
            rule_count: self.target.len(),
            reports,
        }
    }

    fn reset(&mut self) {
        self.target.clear();
        self.emitted.clear();
    }
}
