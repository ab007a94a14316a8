//! Refresh checkpoints under one or more roots

use crate::system_config::SystemConfig;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use vacuum_tracker::Tracker;

pub async fn run(config: &SystemConfig, roots: Vec<PathBuf>) -> Result<()> {
    let roots = super::resolve_roots(roots)?;
    let tracker = Tracker::new(roots.clone(), config.tracking.clone());

    // Queue every root up front; the gate runs them in order
    let pending: Vec<_> = roots.iter().map(|root| tracker.refresh_all(root)).collect();

    let mut failed_roots = 0;
    for (root, report) in roots.iter().zip(pending) {
        match report.await {
            Ok(report) => {
                println!(
                    "{} {}: {} created, {} unchanged{}",
                    "✓".green(),
                    root.display(),
                    report.created,
                    report.unchanged,
                    if report.failed.is_empty() {
                        String::new()
                    } else {
                        format!(", {} failed", report.failed.len()).red().to_string()
                    }
                );
                for (file, err) in &report.failed {
                    println!("  {} {}: {}", "✗".red(), file.display(), err);
                }
            }
            Err(e) => {
                failed_roots += 1;
                eprintln!("{} {}: {}", "✗".red(), root.display(), e);
            }
        }
    }

    if failed_roots > 0 {
        anyhow::bail!("{} of {} roots could not be refreshed", failed_roots, roots.len());
    }
    Ok(())
}
