//! System-wide configuration
//!
//! Stored as TOML at `<config dir>/vacuum/config.toml` (or wherever
//! `--config` points). Missing files and missing keys fall back to defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vacuum_core::IdentitySource;
use vacuum_tracker::TrackerConfig;

/// Daemon behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Master switch for background tracking
    pub enabled: bool,

    /// Name the recorded history is attributed to; tracking stays off
    /// until it is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_name: Option<String>,

    /// Quiet period after the last save before checkpoints are refreshed
    pub checkpoint_debounce_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            participant_name: None,
            checkpoint_debounce_ms: 3_000,
        }
    }
}

impl DaemonConfig {
    /// Enabled and attributed to someone
    pub fn effectively_enabled(&self) -> bool {
        self.enabled
            && self
                .participant_name
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub tracking: TrackerConfig,
    pub daemon: DaemonConfig,
}

/// Keys accepted by `vac config get/set`
pub const KEYS: &[&str] = &[
    "tracking.log_dir",
    "tracking.identity",
    "tracking.max_chain_depth",
    "tracking.extensions",
    "tracking.file_names",
    "tracking.excluded_dirs",
    "daemon.enabled",
    "daemon.participant_name",
    "daemon.checkpoint_debounce_ms",
];

impl SystemConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.tracking.validate()?;

        if !(100..=3_600_000).contains(&self.daemon.checkpoint_debounce_ms) {
            anyhow::bail!(
                "daemon.checkpoint_debounce_ms must be between 100 and 3600000, got {}",
                self.daemon.checkpoint_debounce_ms
            );
        }
        Ok(())
    }

    /// Render one value as `vac config get` prints it
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "tracking.log_dir" => self.tracking.log_dir.clone(),
            "tracking.identity" => match self.tracking.identity {
                IdentitySource::Git => "git".to_string(),
                IdentitySource::None => "none".to_string(),
            },
            "tracking.max_chain_depth" => self.tracking.max_chain_depth.to_string(),
            "tracking.extensions" => self.tracking.classifier.extensions.join(","),
            "tracking.file_names" => self.tracking.classifier.file_names.join(","),
            "tracking.excluded_dirs" => self.tracking.classifier.excluded_dirs.join(","),
            "daemon.enabled" => self.daemon.enabled.to_string(),
            "daemon.participant_name" => self.daemon.participant_name.clone().unwrap_or_default(),
            "daemon.checkpoint_debounce_ms" => self.daemon.checkpoint_debounce_ms.to_string(),
            _ => anyhow::bail!(
                "Unknown config key: {}. Use 'vac config list' to see available keys.",
                key
            ),
        };
        Ok(value)
    }

    /// Parse and assign one value; does not validate
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "tracking.log_dir" => self.tracking.log_dir = value.to_string(),
            "tracking.identity" => {
                self.tracking.identity = match value {
                    "git" => IdentitySource::Git,
                    "none" => IdentitySource::None,
                    _ => anyhow::bail!("Invalid value: must be 'git' or 'none'"),
                }
            }
            "tracking.max_chain_depth" => {
                self.tracking.max_chain_depth = value
                    .parse()
                    .context("Invalid value: must be a positive integer")?;
            }
            "tracking.extensions" => self.tracking.classifier.extensions = split_list(value),
            "tracking.file_names" => self.tracking.classifier.file_names = split_list(value),
            "tracking.excluded_dirs" => self.tracking.classifier.excluded_dirs = split_list(value),
            "daemon.enabled" => {
                self.daemon.enabled = value
                    .parse()
                    .context("Invalid value: must be 'true' or 'false'")?;
            }
            "daemon.participant_name" => {
                let name = value.trim();
                self.daemon.participant_name = (!name.is_empty()).then(|| name.to_string());
            }
            "daemon.checkpoint_debounce_ms" => {
                self.daemon.checkpoint_debounce_ms = value
                    .parse()
                    .context("Invalid value: must be a positive integer")?;
            }
            _ => anyhow::bail!(
                "Unknown config key: {}. Use 'vac config list' to see available keys.",
                key
            ),
        }
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Default config file location
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vacuum").join("config.toml"))
}

/// The `--config` override, or the default location
pub fn resolve_path(override_path: Option<&Path>) -> Result<PathBuf> {
    match override_path {
        Some(path) => Ok(path.to_path_buf()),
        None => config_file_path().context("Could not determine config file path"),
    }
}

/// Load configuration; a missing file yields defaults
pub fn load_from(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        return Ok(SystemConfig::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

pub fn load(override_path: Option<&Path>) -> Result<SystemConfig> {
    load_from(&resolve_path(override_path)?)
}

/// Write configuration, creating parent directories
pub fn save_to(path: &Path, config: &SystemConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

/// Create the config file with defaults if it does not exist
pub fn init_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_to(path, &SystemConfig::default())?;
    Ok(true)
}

/// Annotated example configuration
pub fn example_config() -> &'static str {
    r#"# Vacuum configuration

[tracking]
# Log directory created inside every tracked root
log_dir = ".changes"
# Identity namespace: "git" (HEAD commit) or "none"
identity = "git"
# Longest checkpoint reference chain followed
max_chain_depth = 1024
extensions = ["lean"]
file_names = ["lakefile.lean", "lakefile.toml", "lean-toolchain"]
excluded_dirs = [".lake", ".git"]

[daemon]
enabled = true
# Tracking stays off until a name is set
participant_name = "Ada Lovelace"
# Quiet period after the last save before checkpoints are refreshed
checkpoint_debounce_ms = 3000
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, SystemConfig::default());
        assert!(!config.daemon.effectively_enabled());
    }

    #[test]
    fn test_example_parses() {
        let config: SystemConfig = toml::from_str(example_config()).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.daemon.effectively_enabled());
        assert_eq!(config.tracking, TrackerConfig::default());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.toml");

        let mut config = SystemConfig::default();
        config.set("daemon.participant_name", "  Grace ").unwrap();
        config.set("tracking.extensions", "lean, md").unwrap();
        save_to(&path, &config).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.get("daemon.participant_name").unwrap(), "Grace");
        assert_eq!(loaded.tracking.classifier.extensions, vec!["lean", "md"]);
    }

    #[test]
    fn test_every_key_gets() {
        let config = SystemConfig::default();
        for key in KEYS {
            assert!(config.get(key).is_ok(), "{key}");
        }
        assert!(config.get("daemon.nope").is_err());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = SystemConfig::default();
        assert!(config.set("daemon.enabled", "maybe").is_err());
        assert!(config.set("tracking.identity", "svn").is_err());

        config.set("daemon.checkpoint_debounce_ms", "5").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_name_disables() {
        let mut daemon = DaemonConfig {
            participant_name: Some("   ".into()),
            ..Default::default()
        };
        assert!(!daemon.effectively_enabled());
        daemon.participant_name = Some("Ada".into());
        assert!(daemon.effectively_enabled());
        daemon.enabled = false;
        assert!(!daemon.effectively_enabled());
    }
}
