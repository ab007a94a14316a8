//! Log change events from stdin
//!
//! Input is one `ChangeEvent` JSON object per line. Bad lines and failed
//! edits are reported and skipped; the command fails at the end if any were.

use crate::system_config::SystemConfig;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use vacuum_tracker::{LogOutcome, Tracker};

pub async fn run(config: &SystemConfig, roots: Vec<PathBuf>) -> Result<()> {
    let roots = super::resolve_roots(roots)?;
    let tracker = Tracker::new(roots, config.tracking.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let (mut logged, mut ignored, mut failed) = (0usize, 0usize, 0usize);
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let event = match super::parse_event(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Line {}: {:#}", line_no, e);
                failed += 1;
                continue;
            }
        };

        match tracker.log_edit(event).await {
            Ok(LogOutcome::Logged(edit)) => {
                logged += 1;
                println!("{} {} @ {}", "logged".green(), edit.file, edit.time);
            }
            Ok(LogOutcome::Ignored) => ignored += 1,
            Err(e) => {
                warn!("Line {}: {}", line_no, e);
                failed += 1;
            }
        }
    }

    eprintln!("{} logged, {} ignored, {} failed", logged, ignored, failed);
    if failed > 0 {
        anyhow::bail!("{} change events could not be logged", failed);
    }
    Ok(())
}
