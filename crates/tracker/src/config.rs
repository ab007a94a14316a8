//! Tracker configuration
//!
//! Every field has a serde default, so an empty `[tracking]` table (or no
//! table at all) yields the stock Lean setup.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vacuum_core::{IdentitySource, DEFAULT_LOG_DIR_NAME};
use vacuum_journal::DEFAULT_MAX_CHAIN_DEPTH;

/// Which files and directories are in scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// File extensions to track, without the dot
    pub extensions: Vec<String>,

    /// Exact file names to track regardless of extension
    pub file_names: Vec<String>,

    /// Directory names never descended into
    /// (the log directory is always added on top of these)
    pub excluded_dirs: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["lean".into()],
            file_names: vec![
                "lakefile.lean".into(),
                "lakefile.toml".into(),
                "lean-toolchain".into(),
            ],
            excluded_dirs: vec![".lake".into(), ".git".into()],
        }
    }
}

/// Tracking engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Name of the log directory created inside each root
    pub log_dir: String,

    /// How the identity namespace below the log directory is chosen
    pub identity: IdentitySource,

    /// Longest reference chain followed before giving up
    pub max_chain_depth: usize,

    #[serde(flatten)]
    pub classifier: ClassifierConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            log_dir: DEFAULT_LOG_DIR_NAME.into(),
            identity: IdentitySource::default(),
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            classifier: ClassifierConfig::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("log_dir must be a single non-empty directory name, got {0:?}")]
    InvalidLogDir(String),

    #[error("max_chain_depth must be at least 1")]
    ZeroChainDepth,

    #[error("extension {0:?} must not be empty or start with a dot")]
    InvalidExtension(String),
}

impl TrackerConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let log_dir = self.log_dir.as_str();
        if log_dir.is_empty() || log_dir == "." || log_dir == ".." || log_dir.contains(['/', '\\']) {
            return Err(ConfigError::InvalidLogDir(self.log_dir.clone()));
        }
        if self.max_chain_depth == 0 {
            return Err(ConfigError::ZeroChainDepth);
        }
        if let Some(ext) = self
            .classifier
            .extensions
            .iter()
            .find(|e| e.is_empty() || e.starts_with('.'))
        {
            return Err(ConfigError::InvalidExtension(ext.clone()));
        }
        Ok(())
    }
}
