//! Contract Tests for End-to-End Listing
//!
//! These tests list a real temporary directory through a real `sh`
//! session, so the command strings, `wc -l` counts and `stat -t` parsing
//! are all exercised against the actual tools.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use rootops::config::ListingPreferences;
use rootops::models::InventoryEntry;
use rootops::ops::{EntryKind, PendingDeletions, RootOps};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use test_utils::test_config;

/// docs/ with three visible children and one hidden, a.txt of 42 bytes, .secret
fn populated_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    for name in ["one", "two", "three", ".hidden"] {
        fs::write(docs.join(name), b"x").unwrap();
    }
    fs::write(dir.path().join("a.txt"), vec![b'a'; 42]).unwrap();
    fs::write(dir.path().join(".secret"), b"s").unwrap();
    dir
}

fn find<'a>(entries: &'a [InventoryEntry], name: &str) -> &'a InventoryEntry {
    entries
        .iter()
        .find(|entry| entry.name == name)
        .unwrap_or_else(|| panic!("{} missing from {:?}", name, entries))
}

#[tokio::test]
async fn test_list_real_directory() {
    let dir = populated_dir();
    let ops = RootOps::new(&test_config());

    let entries = ops.list(dir.path()).await.unwrap();
    assert_eq!(entries.len(), 2);

    let docs = find(&entries, "docs");
    assert!(docs.is_directory);
    assert_eq!(docs.child_count, 3);
    assert_eq!(docs.size_bytes, 0);
    assert_eq!(Path::new(&docs.path), dir.path().join("docs"));

    let file = find(&entries, "a.txt");
    assert!(!file.is_directory);
    assert_eq!(file.size_bytes, 42);
    assert_eq!(file.child_count, 0);

    ops.close().await.unwrap();
}

#[tokio::test]
async fn test_list_with_hidden_entries() {
    let dir = populated_dir();
    let ops = RootOps::with_preferences(&test_config(), ListingPreferences::new(true));

    let entries = ops.list(dir.path()).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(find(&entries, "docs").child_count, 4);
    assert_eq!(find(&entries, ".secret").size_bytes, 1);

    ops.preferences().set_show_hidden(false);
    let entries = ops.list(dir.path()).await.unwrap();
    assert_eq!(entries.len(), 2);

    ops.close().await.unwrap();
}

#[tokio::test]
async fn test_list_names_with_spaces() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("My Notes.txt"), b"12345").unwrap();
    fs::create_dir(dir.path().join("Sub Dir")).unwrap();
    let ops = RootOps::new(&test_config());

    let entries = ops.list(dir.path()).await.unwrap();
    assert_eq!(find(&entries, "My Notes.txt").size_bytes, 5);
    assert!(find(&entries, "Sub Dir").is_directory);
    assert_eq!(find(&entries, "Sub Dir").child_count, 0);

    ops.close().await.unwrap();
}

#[tokio::test]
async fn test_list_empty_and_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let ops = RootOps::new(&test_config());

    assert!(ops.list(dir.path()).await.unwrap().is_empty());
    assert!(ops
        .list(&dir.path().join("missing"))
        .await
        .unwrap()
        .is_empty());

    ops.close().await.unwrap();
}

#[tokio::test]
async fn test_create_and_delete_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let ops = RootOps::new(&test_config());

    // Environments without a readable mount table cannot resolve the mount
    let table = ops.mount_table().await.unwrap();
    if table.resolve(dir.path()).is_none() {
        ops.close().await.unwrap();
        return;
    }

    let file = dir.path().join("created.txt");
    let sub = dir.path().join("created dir");
    assert!(ops
        .create(&file.to_string_lossy(), EntryKind::File)
        .await
        .unwrap());
    assert!(ops
        .create(&sub.to_string_lossy(), EntryKind::Directory)
        .await
        .unwrap());
    assert!(file.is_file());
    assert!(sub.is_dir());

    let pending: PendingDeletions = [&file, &sub]
        .iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    assert!(ops.delete(&pending).await.unwrap());
    assert!(!file.exists());
    assert!(!sub.exists());

    ops.close().await.unwrap();
}
