//! Checkpoints, edits and replay working together on a real directory

use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vacuum_core::{ContentChange, Identity, LogLayout, Millis, Position, TextRange};
use vacuum_journal::{reconstruct_at, Checkpoint, CheckpointStore, EditLog, RefreshOutcome};

const T0: Millis = 1_700_000_000_000;
const T1: Millis = 1_700_000_001_500;
const T2: Millis = 1_700_000_003_000;

fn write_at(path: &Path, content: &str, mtime_ms: Millis) {
    fs::write(path, content).unwrap();
    let ft = FileTime::from_unix_time((mtime_ms / 1000) as i64, ((mtime_ms % 1000) * 1_000_000) as u32);
    set_file_mtime(path, ft).unwrap();
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn test_edit_then_save_round() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let store = CheckpointStore::new(LogLayout::new(root, ".changes", Some(&Identity::NoVcs)));
    let log = EditLog::new(&store);
    let file = root.join("a.lean");

    write_at(&file, "theorem", T0);
    store.refresh(&file).unwrap();

    log.append(
        &file,
        vec![ContentChange::insertion(Position::new(0, 7), 7, " foo")],
        T1,
    )
    .unwrap();

    write_at(&file, "theorem foo", T2);
    let outcome = store.refresh(&file).unwrap();
    assert!(matches!(outcome, RefreshOutcome::Created(Checkpoint::Content { .. })));

    let file_dir = root.join(".changes/no-git/a.lean");
    let first = read_json(&file_dir.join(format!("concrete-history/{T0}")));
    assert_eq!(first["type"], "new");
    assert_eq!(first["contents"], "theorem");
    assert_eq!(first["mtime"], T0);

    let edit = read_json(&file_dir.join(format!("edits-history/{T1}")));
    assert_eq!(edit["baseTime"], T0);
    assert_eq!(edit["time"], T1);
    assert_eq!(edit["changes"][0]["rangeOffset"], 7);
    assert_eq!(edit["changes"][0]["rangeLength"], 0);
    assert_eq!(edit["changes"][0]["text"], " foo");

    let second = read_json(&file_dir.join(format!("concrete-history/{T2}")));
    assert_eq!(second["type"], "new");
    assert_eq!(second["contents"], "theorem foo");

    // Replaying the edit on the first checkpoint matches what was saved
    let rebuilt = reconstruct_at(&store, &file, T1).unwrap().unwrap();
    assert_eq!(rebuilt.base, T0);
    assert_eq!(rebuilt.applied, 1);
    assert_eq!(rebuilt.contents, "theorem foo");

    let latest = reconstruct_at(&store, &file, T2).unwrap().unwrap();
    assert_eq!(latest.base, T2);
    assert_eq!(latest.applied, 0);
    assert_eq!(latest.contents, "theorem foo");

    assert!(reconstruct_at(&store, &file, T0 - 1).unwrap().is_none());
}

#[test]
fn test_reconstruct_through_reference_checkpoint() {
    let temp_dir = TempDir::new().unwrap();
    let store = CheckpointStore::new(LogLayout::new(temp_dir.path(), ".changes", None));
    let log = EditLog::new(&store);
    let file = temp_dir.path().join("b.lean");

    write_at(&file, "def x := 1", T0);
    store.refresh(&file).unwrap();
    // Saved without changes
    write_at(&file, "def x := 1", T1);
    store.refresh(&file).unwrap();

    let replace = ContentChange {
        range: TextRange::new(Position::new(0, 9), Position::new(0, 10)),
        text: "2".into(),
        range_offset: 9,
        range_length: 1,
    };
    let edit = log.append(&file, vec![replace], T1 + 10).unwrap();
    assert_eq!(edit.base_time, T1);

    let rebuilt = reconstruct_at(&store, &file, T2).unwrap().unwrap();
    assert_eq!(rebuilt.base, T1);
    assert_eq!(rebuilt.contents, "def x := 2");
}

#[test]
fn test_identities_do_not_mix() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let file = root.join("a.lean");
    write_at(&file, "theorem", T0);

    let a = CheckpointStore::new(LogLayout::new(root, ".changes", Some(&Identity::Commit("a".repeat(40)))));
    let b = CheckpointStore::new(LogLayout::new(root, ".changes", Some(&Identity::Commit("b".repeat(40)))));

    assert!(a.refresh(&file).unwrap().created().is_some());
    assert!(b.refresh(&file).unwrap().created().is_some());
    assert_eq!(a.keys(&file).unwrap(), vec![T0]);
    assert_eq!(b.keys(&file).unwrap(), vec![T0]);
}

fn insert(offset: u64, text: &str) -> Vec<ContentChange> {
    vec![ContentChange::insertion(Position::new(0, offset as u32), offset, text)]
}

#[test]
fn test_reconstruct_keeps_edits_typed_before_a_late_refresh() {
    let temp_dir = TempDir::new().unwrap();
    let store = CheckpointStore::new(LogLayout::new(temp_dir.path(), ".changes", None));
    let log = EditLog::new(&store);
    let file = temp_dir.path().join("a.lean");

    write_at(&file, "theorem", 1_000_000);
    store.refresh(&file).unwrap();
    log.append(&file, insert(7, " foo"), 1_001_000).unwrap();

    // Saved at 1_002_000, but the refresh only runs after more typing
    write_at(&file, "theorem foo", 1_002_000);
    let typed = log.append(&file, insert(11, "!"), 1_002_500).unwrap();
    assert_eq!(typed.base_time, 1_000_000);
    store.refresh(&file).unwrap();
    assert_eq!(store.keys(&file).unwrap(), vec![1_000_000, 1_002_000]);

    let rebuilt = reconstruct_at(&store, &file, 1_002_600).unwrap().unwrap();
    assert_eq!(rebuilt.base, 1_000_000);
    assert_eq!(rebuilt.applied, 2);
    assert_eq!(rebuilt.contents, "theorem foo!");

    // Between the save and the typing the saved checkpoint is the base
    let saved = reconstruct_at(&store, &file, 1_002_100).unwrap().unwrap();
    assert_eq!(saved.base, 1_002_000);
    assert_eq!(saved.contents, "theorem foo");
}

#[test]
fn test_corrupt_record_does_not_break_unrelated_reads() {
    let temp_dir = TempDir::new().unwrap();
    let store = CheckpointStore::new(LogLayout::new(temp_dir.path(), ".changes", None));
    let log = EditLog::new(&store);
    let file = temp_dir.path().join("a.lean");

    write_at(&file, "theorem", 1_000_000);
    store.refresh(&file).unwrap();
    log.append(&file, insert(7, " foo"), 1_001_000).unwrap();

    let layout = store.layout();
    fs::write(layout.edits_dir(&file).unwrap().join("9999999"), b"{not json").unwrap();
    fs::write(layout.concrete_dir(&file).unwrap().join("9999999"), b"{not json").unwrap();

    let rebuilt = reconstruct_at(&store, &file, 1_001_500).unwrap().unwrap();
    assert_eq!(rebuilt.contents, "theorem foo");

    // Listing skips the bad records
    assert_eq!(log.list(&file).unwrap().len(), 1);
    assert_eq!(store.history(&file).unwrap().len(), 1);

    // Reading the bad record itself still fails
    assert!(log.load(&file, 9_999_999).is_err());
    assert!(reconstruct_at(&store, &file, 10_000_000).is_err());
}
