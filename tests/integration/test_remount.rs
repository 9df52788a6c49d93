//! Integration Tests for Scoped Remounting
//!
//! These tests verify which mount commands surround a privileged write and
//! that a read-only mount is always restored.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use rootops::config::ListingPreferences;
use rootops::error::{Error, Result};
use rootops::mount::Remounter;
use rootops::ops::{EntryKind, OperationEvent, PendingDeletions, RootOps};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use test_utils::{android_mount_lines, test_config, MockShell};

fn android_shell() -> MockShell {
    MockShell::new().on_lines("mount", android_mount_lines())
}

async fn exploding_write() -> Result<()> {
    panic!("write exploded")
}

#[tokio::test]
async fn test_read_write_mount_issues_no_remount() {
    let remounter = Remounter::new(android_shell());
    let calls = AtomicUsize::new(0);
    let calls_ref = &calls;

    remounter
        .with_writable_mount(Path::new("/data/local/tmp/x"), move || async move {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(remounter.executor().commands(), vec!["mount".to_string()]);
}

#[tokio::test]
async fn test_read_only_mount_is_bracketed() {
    let remounter = Remounter::new(android_shell());

    remounter
        .with_writable_mount(Path::new("/vendor/etc/x"), || async { Ok(()) })
        .await
        .unwrap();

    assert_eq!(
        remounter.executor().commands(),
        vec![
            "mount".to_string(),
            "mount -o rw,remount /vendor".to_string(),
            "umount -r /vendor".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_longest_prefix_selects_mount() {
    let remounter = Remounter::new(android_shell());
    let record = remounter
        .resolve(Path::new("/storage/emulated/0/file"))
        .await
        .unwrap();
    assert_eq!(record.mount_point, "/storage/emulated");

    let record = remounter.resolve(Path::new("/system/bin")).await.unwrap();
    assert_eq!(record.mount_point, "/");
}

#[tokio::test]
async fn test_restore_runs_when_action_fails() {
    let remounter = Remounter::new(android_shell());

    let result: Result<()> = remounter
        .with_writable_mount(Path::new("/system/app"), || async {
            Err(Error::Other("disk full".to_string()))
        })
        .await;

    assert!(matches!(result, Err(Error::Other(_))));
    assert_eq!(remounter.executor().count("mount -o rw,remount /"), 1);
    assert_eq!(remounter.executor().count("umount -r /"), 1);
}

#[tokio::test]
async fn test_restore_runs_when_action_panics() {
    let shell = Arc::new(android_shell());
    let remounter = Remounter::new(shell.clone());

    let handle = tokio::spawn(async move {
        remounter
            .with_writable_mount(Path::new("/system/app"), exploding_write)
            .await
    });

    let err = handle.await.unwrap_err();
    assert!(err.is_panic());
    assert_eq!(shell.count("mount -o rw,remount /"), 1);
    assert_eq!(shell.count("umount -r /"), 1);
}

#[tokio::test]
async fn test_restore_runs_when_write_times_out() {
    let shell = android_shell()
        .hang_on("touch /vendor/etc/x")
        .with_timeout(Duration::from_millis(50));
    let ops = RootOps::with_executor(
        Arc::new(shell),
        &test_config(),
        ListingPreferences::default(),
    );

    let err = ops.create("/vendor/etc/x", EntryKind::File).await.unwrap_err();
    assert!(matches!(err, Error::CommandTimeout { .. }));

    let shell = ops.executor();
    assert_eq!(shell.interrupts(), 1);
    assert_eq!(shell.count("umount -r /vendor"), 1);
    assert_eq!(
        shell.commands().last().map(String::as_str),
        Some("umount -r /vendor")
    );
}

#[tokio::test]
async fn test_failed_restore_is_reported() {
    let remounter = Remounter::new(android_shell().on("umount -r /", &[], 1));

    let result = remounter
        .with_writable_mount(Path::new("/system/app"), || async { Ok(()) })
        .await;

    match result {
        Err(Error::RemountFailed {
            mount_point,
            exit_code,
        }) => {
            assert_eq!(mount_point, "/");
            assert_eq!(exit_code, 1);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_create_on_read_only_system() {
    let shell = Arc::new(android_shell());
    let ops = RootOps::with_executor(shell.clone(), &test_config(), ListingPreferences::default());
    let mut events = ops.subscribe();

    let created = ops
        .create("//system/etc/hosts.bak", EntryKind::File)
        .await
        .unwrap();

    assert!(created);
    assert_eq!(
        shell.commands(),
        vec![
            "mount".to_string(),
            "mount -o rw,remount /".to_string(),
            "touch /system/etc/hosts.bak".to_string(),
            "umount -r /".to_string(),
        ]
    );
    assert_eq!(
        events.try_recv(),
        Some(OperationEvent::MutationComplete {
            path: "/system/etc/hosts.bak".to_string(),
            success: true,
        })
    );
}

#[tokio::test]
async fn test_failed_create_reports_false() {
    let shell = Arc::new(android_shell().on("mkdir /data/exists", &[], 1));
    let ops = RootOps::with_executor(shell.clone(), &test_config(), ListingPreferences::default());
    let mut events = ops.subscribe();

    let created = ops
        .create("/data/exists", EntryKind::Directory)
        .await
        .unwrap();

    assert!(!created);
    assert_eq!(
        events.try_recv(),
        Some(OperationEvent::MutationComplete {
            path: "/data/exists".to_string(),
            success: false,
        })
    );
}

#[tokio::test]
async fn test_delete_batches_into_one_command() {
    let shell = Arc::new(android_shell());
    let ops = RootOps::with_executor(shell.clone(), &test_config(), ListingPreferences::default());

    let mut pending = PendingDeletions::new();
    pending.insert("/vendor/a");
    pending.insert("/vendor/b");
    pending.insert("/vendor/a");

    assert!(ops.delete(&pending).await.unwrap());
    assert_eq!(
        shell.commands(),
        vec![
            "mount".to_string(),
            "mount -o rw,remount /vendor".to_string(),
            "rm -rf /vendor/a /vendor/b".to_string(),
            "umount -r /vendor".to_string(),
        ]
    );
}
