//! Print a file reconstructed from its log

use crate::system_config::SystemConfig;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use vacuum_core::Millis;
use vacuum_tracker::Tracker;

pub async fn run(config: &SystemConfig, file: &Path, at: Option<Millis>, root: Option<PathBuf>) -> Result<()> {
    let file = super::absolute(file)?;
    let root = super::resolve_root(&file, root, &config.tracking.log_dir)?;
    let tracker = Tracker::new(vec![root], config.tracking.clone());

    let at = at.unwrap_or(Millis::MAX);
    let rebuilt = tracker
        .reconstruct(&file, at)
        .await
        .with_context(|| format!("Failed to reconstruct {}", file.display()))?
        .with_context(|| format!("No checkpoint of {} at or before {}", file.display(), at))?;

    info!(
        "Rebuilt {} from checkpoint {} plus {} edits",
        file.display(),
        rebuilt.base,
        rebuilt.applied
    );

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rebuilt.contents.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
