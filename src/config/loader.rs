//! Configuration file discovery and loading.

use std::path::{Path, PathBuf};

use super::types::ProjectConfig;

/// Candidate configuration filename.
const CONFIG_FILE: &str = "classweave.toml";

/// Project subdirectories searched for the configuration file, in order.
const SEARCH_DIRS: [&str; 4] = [".", "src", "pages", "docs"];

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with the default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths: Vec<PathBuf> = SEARCH_DIRS
            .iter()
            .map(|dir| Path::new(dir).join(CONFIG_FILE))
            .collect();

        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("classweave").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader pinned to a specific file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Find the first config file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .find(|p| p.is_file())
            .map(|p| std::path::absolute(p).unwrap_or_else(|_| p.clone()))
    }

    /// Load configuration from a specific path, falling back to defaults.
    ///
    /// Load and parse failures are recoverable-soft: a warning names the
    /// offending file and execution continues with an empty configuration.
    #[must_use]
    pub fn load_or_default(path: &Path) -> ProjectConfig {
        match Self::load_from_path(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Failed to load config, using defaults");
                ProjectConfig::default()
            }
        }
    }

    fn load_from_path(path: &Path) -> Result<ProjectConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}
