//! Configuration types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Project configuration loaded from a TOML file.
///
/// The pipeline treats this as opaque options for the generation engine;
/// only the style marker is consulted directly when writing the artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// CSS emitted on every generation pass, before any rule output.
    pub base: String,
    /// Placeholder element replaced by the generated stylesheet.
    pub marker: String,
    /// Mapping from class token to its CSS declarations.
    pub rules: BTreeMap<String, String>,
}

fn default_marker() -> String {
    "<style id=\"__classweave\"></style>".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            base: String::new(),
            marker: default_marker(),
            rules: BTreeMap::new(),
        }
    }
}
