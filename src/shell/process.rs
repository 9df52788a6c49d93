//! Shell Process Spawning
//!
//! Starts the privileged shell with piped stdio and wires up the background
//! tasks that outlive the spawn call: stderr draining and exit tracking.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, watch, RwLock};

use crate::config::ShellConfig;
use crate::error::{Error, Result};
use crate::models::ShellProcess;

/// Handles produced by a successful spawn
pub(crate) struct SpawnedShell {
    pub process: Arc<RwLock<ShellProcess>>,
    pub stdin: ChildStdin,
    pub stdout: BufReader<ChildStdout>,
    /// Fires a kill when sent to, or when dropped
    pub kill_tx: oneshot::Sender<()>,
    /// Flips to true once the process has exited
    pub exited_rx: watch::Receiver<bool>,
}

/// Spawn the configured shell program
///
/// # Errors
/// `SessionUnavailable` when the program is missing or not executable by
/// this user (no root on the device); `Io` for any other spawn failure.
pub(crate) fn spawn_shell_process(config: &ShellConfig) -> Result<SpawnedShell> {
    let mut command = Command::new(&config.program);
    command
        .args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .env_clear()
        .envs(get_effective_environment(&config.env, config.inherit_env));

    let mut child = command.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => Error::SessionUnavailable {
            reason: format!("cannot start '{}': {}", config.program, e),
        },
        _ => Error::Io(e),
    })?;

    let pipes = (child.stdin.take(), child.stdout.take(), child.stderr.take());
    let (stdin, stdout, stderr) = match pipes {
        (Some(stdin), Some(stdout), Some(stderr)) => (stdin, stdout, stderr),
        _ => {
            return Err(Error::SessionUnavailable {
                reason: format!("'{}' started without piped stdio", config.program),
            })
        }
    };

    let mut process = ShellProcess::new(config.program.clone(), config.args.clone());
    process.mark_started(child.id());
    info!("Started shell: {}", process);
    let process = Arc::new(RwLock::new(process));

    drain_stderr(stderr, config.program.clone());

    let (kill_tx, kill_rx) = oneshot::channel();
    let (exited_tx, exited_rx) = watch::channel(false);
    track_exit(child, process.clone(), kill_rx, exited_tx);

    Ok(SpawnedShell {
        process,
        stdin,
        stdout: BufReader::new(stdout),
        kill_tx,
        exited_rx,
    })
}

/// Log stderr continuously so a chatty command can never fill the pipe
fn drain_stderr(stderr: ChildStderr, program: String) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stderr);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    debug!("{} stderr: {}", program, line.trim_end());
                }
                Err(e) => {
                    debug!("{} stderr read error: {}", program, e);
                    break;
                }
            }
        }
        debug!("{} stderr drain exiting", program);
    });
}

/// Wait for the child to exit, or kill it on request
fn track_exit(
    mut child: Child,
    process: Arc<RwLock<ShellProcess>>,
    kill_rx: oneshot::Receiver<()>,
    exited_tx: watch::Sender<bool>,
) {
    tokio::spawn(async move {
        let exit_code = tokio::select! {
            status = child.wait() => status.ok().and_then(|s| s.code()),
            _ = kill_rx => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill shell: {}", e);
                }
                None
            }
        };

        let mut process = process.write().await;
        process.mark_terminated(exit_code);
        info!("Shell exited: {}", process);
        let _ = exited_tx.send(true);
    });
}

/// Environment the shell will see
pub fn get_effective_environment(
    custom_env: &HashMap<String, String>,
    inherit: bool,
) -> HashMap<String, String> {
    let mut env = if inherit {
        std::env::vars().collect()
    } else {
        HashMap::new()
    };

    for (key, value) in custom_env {
        env.insert(key.clone(), value.clone());
    }

    env
}
