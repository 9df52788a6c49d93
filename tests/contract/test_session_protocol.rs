//! Contract Tests for the Shell Line Protocol
//!
//! These tests run a real `sh` and verify ordering, exit codes, stream
//! shape and session lifecycle.

use futures::StreamExt;
use rootops::config::ShellConfig;
use rootops::error::Error;
use rootops::executor::{CommandEvent, CommandExecutor, RequestIds};
use rootops::inventory::shell_quote;
use rootops::shell::{Session, SessionManager};
use std::sync::Arc;
use std::time::{Duration, Instant};

async fn sh() -> Session {
    Session::spawn(&ShellConfig::unprivileged("sh"))
        .await
        .expect("sh should start")
}

#[tokio::test]
async fn test_output_and_exit_code() {
    let session = sh().await;
    let ids = RequestIds::new();

    let result = session
        .run(ids.request("echo one; echo two; (exit 3)"))
        .await
        .unwrap();

    assert_eq!(result.output_lines, vec!["one".to_string(), "two".to_string()]);
    assert_eq!(result.exit_code, 3);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_stream_ends_with_single_completion() {
    let session = sh().await;
    let ids = RequestIds::new();

    let mut stream = session.submit(ids.request("printf 'a\\nb\\n'")).await.unwrap();
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event);
    }

    assert_eq!(
        events,
        vec![
            CommandEvent::Output("a".to_string()),
            CommandEvent::Output("b".to_string()),
            CommandEvent::Completed { exit_code: 0 },
        ]
    );
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_output_without_trailing_newline() {
    let session = sh().await;
    let result = session
        .run(RequestIds::new().request("printf partial"))
        .await
        .unwrap();
    assert_eq!(result.output_lines, vec!["partial".to_string()]);
    assert!(result.success());
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_stderr_never_reaches_output() {
    let session = sh().await;
    let result = session
        .run(RequestIds::new().request("echo out; echo err >&2; echo done"))
        .await
        .unwrap();
    assert_eq!(result.output_lines, vec!["out".to_string(), "done".to_string()]);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_invalid_utf8_is_replaced() {
    let session = sh().await;
    let result = session
        .run(RequestIds::new().request("printf 'a\\377b\\n'"))
        .await
        .unwrap();
    assert_eq!(result.output_lines, vec!["a\u{FFFD}b".to_string()]);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_submissions_do_not_interleave() {
    let session = sh().await;
    let ids = Arc::new(RequestIds::new());

    let mut handles = Vec::new();
    for i in 0..16 {
        let session = session.clone();
        let ids = ids.clone();
        handles.push(tokio::spawn(async move {
            let command = format!("for n in 1 2 3; do echo {}-$n; done", i);
            let result = session.run(ids.request(command)).await.unwrap();
            (i, result.output_lines)
        }));
    }

    for handle in handles {
        let (i, lines) = handle.await.unwrap();
        assert_eq!(
            lines,
            vec![format!("{}-1", i), format!("{}-2", i), format!("{}-3", i)]
        );
    }
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_commands_run_in_submission_order() {
    let session = sh().await;
    let ids = Arc::new(RequestIds::new());
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("order.log");
    let log_arg = shell_quote(&log.to_string_lossy());

    let first = session
        .submit(ids.request(format!("sleep 0.2; echo first >> {}", log_arg)))
        .await
        .unwrap();
    let second = {
        let session = session.clone();
        let ids = ids.clone();
        let command = format!("echo second >> {}", log_arg);
        tokio::spawn(async move { session.run(ids.request(command)).await })
    };

    first.collect_result().await.unwrap();
    second.await.unwrap().unwrap();

    let order = std::fs::read_to_string(&log).unwrap();
    assert_eq!(order, "first\nsecond\n");
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_shell_exit_aborts_command() {
    let session = sh().await;

    let err = session
        .run(RequestIds::new().request("exit 7"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CommandAborted { .. }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!session.is_alive().await);

    let err = session
        .run(RequestIds::new().request("true"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CommandSubmissionFailed { .. }));
}

#[tokio::test]
async fn test_manager_recovers_after_shell_exit() {
    let manager = SessionManager::new(ShellConfig::unprivileged("sh"));
    let ids = RequestIds::new();

    let _ = manager.run(ids.request("exit 1")).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let result = manager.run(ids.request("echo back")).await.unwrap();
    assert_eq!(result.output_lines, vec!["back".to_string()]);
    manager.close().await.unwrap();
}

#[tokio::test]
async fn test_command_timeout() {
    let config = ShellConfig {
        command_timeout_ms: 100,
        ..ShellConfig::unprivileged("sh")
    };
    let session = Session::spawn(&config).await.unwrap();

    let err = session
        .run(RequestIds::new().request("sleep 5"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CommandTimeout { .. }));

    // The stuck shell is killed, so the next submission fails fast
    assert!(!session.is_alive().await);
    let started = Instant::now();
    let err = session
        .run(RequestIds::new().request("echo late"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CommandSubmissionFailed { .. }));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_command_after_timeout_runs_on_fresh_shell() {
    let manager = SessionManager::new(ShellConfig {
        command_timeout_ms: 500,
        ..ShellConfig::unprivileged("sh")
    });
    let ids = RequestIds::new();

    let err = manager.run(ids.request("sleep 30")).await.unwrap_err();
    assert!(matches!(err, Error::CommandTimeout { .. }));
    assert!(err.is_retryable());

    let next = tokio::time::timeout(Duration::from_secs(3), manager.run(ids.request("echo hi")))
        .await
        .expect("command after a timeout must not queue behind the stuck one")
        .unwrap();
    assert_eq!(next.output_lines, vec!["hi".to_string()]);
    manager.close().await.unwrap();
}

#[tokio::test]
async fn test_close_does_not_wait_for_stuck_command() {
    let session = sh().await;
    let _stuck = session
        .submit(RequestIds::new().request("sleep 30"))
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(10), session.close())
        .await
        .expect("close must kill a busy shell")
        .unwrap();
    assert!(!session.is_alive().await);
}

#[tokio::test]
async fn test_session_info() {
    let session = sh().await;
    let info = session.info().await;

    assert_eq!(info.id, session.id());
    assert_eq!(info.program, "sh");
    assert!(info.pid.is_some());
    assert!(info.is_alive);

    session.close().await.unwrap();
    assert!(!session.info().await.is_alive);
}
