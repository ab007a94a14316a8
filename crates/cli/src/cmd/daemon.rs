//! Foreground tracking daemon
//!
//! ```text
//! filesystem saves ──► SaveWatcher ──► scheduler.poke(root) ──► refresh_all (debounced)
//! stdin events ──────► log_edit ──────► scheduler.poke(root)
//! ```
//! Runs until Ctrl-C, or until stdin closes when reading events.

use crate::system_config::SystemConfig;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use vacuum_tracker::{CheckpointScheduler, LogOutcome, SaveWatcher, Tracker};

pub async fn run(config: &SystemConfig, roots: Vec<PathBuf>, read_stdin: bool) -> Result<()> {
    if !config.daemon.effectively_enabled() {
        println!(
            "{}",
            "Tracking is off: set daemon.enabled = true and a daemon.participant_name".yellow()
        );
        return Ok(());
    }

    let roots = super::resolve_roots(roots)?;
    let tracker = Tracker::new(roots.clone(), config.tracking.clone());
    info!(
        "Tracking {} roots for {}",
        roots.len(),
        config.daemon.participant_name.as_deref().unwrap_or_default()
    );

    for root in &roots {
        match tracker.refresh_all(root).await {
            Ok(report) => debug!("Initial refresh of {}: {} created", root.display(), report.created),
            Err(e) => warn!("Initial refresh of {} failed: {}", root.display(), e),
        }
    }

    let scheduler = CheckpointScheduler::new(
        tracker.clone(),
        Duration::from_millis(config.daemon.checkpoint_debounce_ms),
    );
    let mut watcher = SaveWatcher::start(tracker.resolver().clone(), tracker.classifier().clone())
        .context("Failed to start filesystem watcher")?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{} Watching {} roots (Ctrl-C to stop)", "✓".green(), roots.len());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            Some(save) = watcher.next() => {
                debug!("Saved {}", save.file.display());
                scheduler.poke(&save.root);
            }
            line = lines.next_line(), if read_stdin => match line {
                Ok(Some(line)) => handle_event(&tracker, &scheduler, &line),
                Ok(None) => {
                    info!("stdin closed, shutting down");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            },
        }
    }

    // Let queued edits reach disk before exiting
    tracker.flush().await?;
    Ok(())
}

fn handle_event(tracker: &Tracker, scheduler: &CheckpointScheduler, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    let event = match super::parse_event(line) {
        Ok(event) => event,
        Err(e) => {
            warn!("Skipping change event: {:#}", e);
            return;
        }
    };

    let root = tracker.resolver().tracking_root(&event.file).map(PathBuf::from);
    let file = event.file.clone();
    let pending = tracker.log_edit(event);
    tokio::spawn(async move {
        match pending.await {
            Ok(LogOutcome::Logged(edit)) => debug!("Logged edit {} for {}", edit.time, edit.file),
            Ok(LogOutcome::Ignored) => {}
            Err(e) => warn!("Dropping edit to {}: {}", file.display(), e),
        }
    });

    if let Some(root) = root {
        scheduler.poke(&root);
    }
}
