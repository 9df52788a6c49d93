//! Integration Tests for the Inventory Pipeline
//!
//! These tests drive the three listing stages through a scripted shell and
//! verify the exact commands sent and the positional mapping of replies.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use rootops::config::ListingPreferences;
use rootops::inventory::InventoryBuilder;
use rootops::ops::{OperationEvent, RootOps};
use std::path::Path;
use std::sync::Arc;
use test_utils::{stat_line, test_config, MockShell};

fn is_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| !name.contains('.'))
        .unwrap_or(false)
}

#[tokio::test]
async fn test_directory_and_file_listing() {
    let shell = MockShell::new()
        .on("ls /x", &["docs", "a.txt"], 0)
        .on("ls /x/docs | wc -l; echo 0", &["3", "0"], 0)
        .on_lines(
            "echo 0; stat -t /x/a.txt 2>/dev/null || echo 0",
            vec!["0".to_string(), stat_line("/x/a.txt", 42)],
        );
    let builder = InventoryBuilder::with_probe(shell, is_dir, ListingPreferences::new(false));

    let entries = builder.list(Path::new("/x")).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path, "/x/docs");
    assert!(entries[0].is_directory);
    assert_eq!(entries[0].child_count, 3);
    assert_eq!(entries[0].size_bytes, 0);
    assert_eq!(entries[1].path, "/x/a.txt");
    assert!(!entries[1].is_directory);
    assert_eq!(entries[1].child_count, 0);
    assert_eq!(entries[1].size_bytes, 42);
    assert_eq!(builder.executor().commands().len(), 3);
}

#[tokio::test]
async fn test_empty_directory_issues_one_command() {
    let shell = MockShell::new().on("ls /empty", &[], 0);
    let builder = InventoryBuilder::with_probe(shell, is_dir, ListingPreferences::new(false));

    let entries = builder.list(Path::new("/empty")).await.unwrap();

    assert!(entries.is_empty());
    assert_eq!(builder.executor().commands(), vec!["ls /empty".to_string()]);
}

#[tokio::test]
async fn test_failed_stat_keeps_positions_aligned() {
    // The middle file vanished between stages; its slot falls back to "0"
    let shell = MockShell::new()
        .on("ls /d", &["a.bin", "gone.bin", "c.bin"], 0)
        .on("echo 0; echo 0; echo 0", &["0", "0", "0"], 0)
        .on_lines(
            "stat -t /d/a.bin 2>/dev/null || echo 0; \
             stat -t /d/gone.bin 2>/dev/null || echo 0; \
             stat -t /d/c.bin 2>/dev/null || echo 0",
            vec![stat_line("/d/a.bin", 10), "0".to_string(), stat_line("/d/c.bin", 30)],
        );
    let builder = InventoryBuilder::with_probe(shell, is_dir, ListingPreferences::new(false));

    let entries = builder.list(Path::new("/d")).await.unwrap();
    let sizes: Vec<u64> = entries.iter().map(|e| e.size_bytes).collect();
    assert_eq!(sizes, vec![10, 0, 30]);
}

#[tokio::test]
async fn test_unparseable_count_defaults_to_zero() {
    let shell = MockShell::new()
        .on("ls /d", &["one", "two"], 0)
        .on(
            "ls /d/one | wc -l; ls /d/two | wc -l",
            &["ls: /d/one: Permission denied", "4"],
            0,
        );
    let builder = InventoryBuilder::with_probe(shell, is_dir, ListingPreferences::new(false));

    let entries = builder.list(Path::new("/d")).await.unwrap();
    assert_eq!(entries[0].child_count, 0);
    assert_eq!(entries[1].child_count, 4);
}

#[tokio::test]
async fn test_hidden_flag_changes_next_listing() {
    let shell = Arc::new(MockShell::new());
    let prefs = ListingPreferences::new(false);
    let builder = InventoryBuilder::with_probe(shell.clone(), is_dir, prefs.clone());

    builder.list(Path::new("/data")).await.unwrap();
    prefs.set_show_hidden(true);
    builder.list(Path::new("/data")).await.unwrap();

    assert_eq!(
        shell.commands(),
        vec!["ls /data".to_string(), "ls -A /data".to_string()]
    );
}

#[tokio::test]
async fn test_paths_with_spaces_are_quoted() {
    let shell = MockShell::new()
        .on("ls '/x/My Files'", &["note.txt"], 0)
        .on_lines(
            "stat -t '/x/My Files/note.txt' 2>/dev/null || echo 0",
            vec![stat_line("/x/My Files/note.txt", 7)],
        );
    let builder = InventoryBuilder::with_probe(shell, is_dir, ListingPreferences::new(false));

    let entries = builder.list(Path::new("/x/My Files")).await.unwrap();
    assert_eq!(entries[0].name, "note.txt");
    assert_eq!(entries[0].size_bytes, 7);
}

#[tokio::test]
async fn test_listing_publishes_inventory_ready() {
    let shell = Arc::new(MockShell::new().on("ls /data/local", &[], 0));
    let ops = RootOps::with_executor(shell, &test_config(), ListingPreferences::new(false));
    let mut events = ops.subscribe();

    ops.list(Path::new("/data/local")).await.unwrap();

    match events.recv().await {
        Some(OperationEvent::InventoryReady { path, entries }) => {
            assert_eq!(path, Path::new("/data/local"));
            assert!(entries.is_empty());
        }
        other => panic!("unexpected event: {:?}", other),
    }
}
