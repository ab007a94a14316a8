//! CLI command implementations

pub mod config;
pub mod daemon;
pub mod history;
pub mod log_edit;
pub mod refresh;
pub mod replay;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use vacuum_core::ChangeEvent;

/// Make `path` absolute against the current directory
///
/// Existing paths are canonicalized so they line up with the paths editors
/// and the filesystem watcher report.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(path))
}

/// Absolute roots, defaulting to the current directory
pub fn resolve_roots(roots: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if roots.is_empty() {
        return Ok(vec![absolute(Path::new("."))?]);
    }
    roots.iter().map(|r| absolute(r)).collect()
}

/// Root for a single-file command: explicit, or the nearest ancestor of
/// `file` that already holds a log directory
pub fn resolve_root(file: &Path, root: Option<PathBuf>, log_dir: &str) -> Result<PathBuf> {
    if let Some(root) = root {
        return absolute(&root);
    }
    file.ancestors()
        .skip(1)
        .find(|dir| dir.join(log_dir).is_dir())
        .map(Path::to_path_buf)
        .with_context(|| {
            format!(
                "No {} directory above {}; pass --root",
                log_dir,
                file.display()
            )
        })
}

/// Parse one line of newline-delimited change event JSON
pub fn parse_event(line: &str) -> Result<ChangeEvent> {
    let mut event: ChangeEvent = serde_json::from_str(line).context("Invalid change event")?;
    event.file = absolute(&event.file)?;
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_root_finds_log_dir() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join(".changes")).unwrap();
        std::fs::create_dir_all(root.join("src/deep")).unwrap();

        let file = root.join("src/deep/A.lean");
        assert_eq!(resolve_root(&file, None, ".changes").unwrap(), root);
        assert!(resolve_root(&file, None, ".history").is_err());
    }

    #[test]
    fn test_parse_event() {
        let event = parse_event(
            r#"{"file":"/work/a.lean","time":5,"changes":[{"range":{"start":{"line":0,"character":7},"end":{"line":0,"character":7}},"text":" foo","rangeOffset":7,"rangeLength":0}]}"#,
        )
        .unwrap();
        assert_eq!(event.file, PathBuf::from("/work/a.lean"));
        assert_eq!(event.time, Some(5));
        assert_eq!(event.changes[0].text, " foo");

        assert!(parse_event("{not json").is_err());
    }
}
