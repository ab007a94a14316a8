//! Show the recorded history of one file

use crate::system_config::SystemConfig;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use vacuum_journal::Checkpoint;
use vacuum_tracker::Tracker;

pub async fn run(config: &SystemConfig, file: &Path, root: Option<PathBuf>, json: bool) -> Result<()> {
    let file = super::absolute(file)?;
    let root = super::resolve_root(&file, root, &config.tracking.log_dir)?;
    let tracker = Tracker::new(vec![root], config.tracking.clone());

    let history = tracker
        .history(&file)
        .await
        .with_context(|| format!("Failed to read history of {}", file.display()))?;

    if json {
        let value = serde_json::json!({
            "checkpoints": history.checkpoints,
            "edits": history.edits,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} {}", "History of".bold(), file.display());

    println!("\n{} ({})", "Checkpoints".yellow(), history.checkpoints.len());
    for cp in &history.checkpoints {
        match cp {
            Checkpoint::Content { contents, mtime } => {
                println!("  {}  {}  {}", mtime.cyan(), "new ".green(), format!("{} bytes", contents.len()).dimmed());
            }
            Checkpoint::Reference { prev_mtime, mtime } => {
                println!("  {}  {}  {}", mtime.cyan(), "same".blue(), format!("-> {}", prev_mtime).dimmed());
            }
        }
    }

    println!("\n{} ({})", "Edits".yellow(), history.edits.len());
    for edit in &history.edits {
        println!(
            "  {}  {} {}  {}",
            edit.time.cyan(),
            "base".dimmed(),
            edit.base_time,
            format!("{} changes", edit.changes.len()).dimmed()
        );
    }

    Ok(())
}
