//! Configuration management command
//!
//! Provides CLI interface to view and edit system configuration.

use crate::system_config::{self, KEYS};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;

/// List all configuration values
pub fn run_list(config_path: Option<&Path>) -> Result<()> {
    let path = system_config::resolve_path(config_path)?;
    let config = system_config::load_from(&path)?;

    println!("{}", "System Configuration".bold());
    println!("{}: {}", "Location".dimmed(), path.display().dimmed());

    let mut section = "";
    for &key in KEYS {
        let (table, name) = key.split_once('.').unwrap_or(("", key));
        if table != section {
            println!("\n{}", format!("[{}]", table).yellow());
            section = table;
        }
        println!("  {} = {}", name.cyan(), config.get(key)?);
    }

    if !config.daemon.effectively_enabled() {
        println!(
            "\n{}",
            "Daemon tracking is off until daemon.enabled = true and daemon.participant_name is set".yellow()
        );
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  tracking.identity: git | none");
    println!("  tracking.max_chain_depth: >= 1");
    println!("  daemon.checkpoint_debounce_ms: 100-3,600,000");

    Ok(())
}

/// Get a single configuration value
pub fn run_get(config_path: Option<&Path>, key: &str) -> Result<()> {
    let config = system_config::load(config_path)?;
    println!("{}", config.get(key)?);
    Ok(())
}

/// Set a configuration value
pub fn run_set(config_path: Option<&Path>, key: &str, value: &str) -> Result<()> {
    let path = system_config::resolve_path(config_path)?;
    let mut config = system_config::load_from(&path)?;

    config.set(key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;

    system_config::save_to(&path, &config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), config.get(key)?);
    println!(
        "{}",
        "Note: Restart the daemon for changes to take effect".yellow()
    );

    Ok(())
}

/// Show the config file path and optionally create it
pub fn run_path(config_path: Option<&Path>, create: bool) -> Result<()> {
    let path = system_config::resolve_path(config_path)?;

    if create && system_config::init_if_missing(&path)? {
        println!("{} Created config file at: {}", "✓".green(), path.display());
    } else {
        println!("{}", path.display());
        if !path.exists() {
            println!("{}", "File does not exist. Use --create to create it.".yellow());
        }
    }

    Ok(())
}

/// Show example configuration
pub fn run_example() -> Result<()> {
    println!("{}", system_config::example_config());
    Ok(())
}
