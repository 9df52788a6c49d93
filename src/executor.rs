//! Command Pipeline Executor
//!
//! The request/result contract every privileged command goes through. A
//! submitted request yields a [`CommandStream`]: output lines in the order
//! the shell emits them, terminated by exactly one completion carrying the
//! exit code.
//!
//! The trait abstraction lets the inventory builder and the remounter run
//! against a live shell [`Session`](crate::shell::Session) or an in-memory
//! executor in tests.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::error::{Error, Result};
use crate::models::{CommandRequest, CommandResult};

/// One event of a running command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
    /// A stdout line, without its newline
    Output(String),
    /// The command finished
    Completed { exit_code: i32 },
    /// The shell went away before the command finished
    Aborted { reason: String },
}

/// Lazy sequence of output lines for one request
pub struct CommandStream {
    request: CommandRequest,
    events: UnboundedReceiver<CommandEvent>,
    finished: bool,
}

impl CommandStream {
    /// Wrap the receiving half of an event channel
    pub fn new(request: CommandRequest, events: UnboundedReceiver<CommandEvent>) -> Self {
        Self {
            request,
            events,
            finished: false,
        }
    }

    /// A stream whose output is already known; used by in-memory executors
    pub fn from_output(request: CommandRequest, lines: Vec<String>, exit_code: i32) -> Self {
        let (tx, rx) = unbounded_channel();
        for line in lines {
            let _ = tx.send(CommandEvent::Output(line));
        }
        let _ = tx.send(CommandEvent::Completed { exit_code });
        Self::new(request, rx)
    }

    /// The request this stream answers
    pub fn request(&self) -> &CommandRequest {
        &self.request
    }

    /// Drain the stream into a [`CommandResult`].
    ///
    /// Lines delivered before a non-zero exit are kept; the caller decides
    /// whether partial output is usable.
    pub async fn collect_result(mut self) -> Result<CommandResult> {
        let mut output_lines = Vec::new();

        while let Some(event) = self.next().await {
            match event {
                CommandEvent::Output(line) => output_lines.push(line),
                CommandEvent::Completed { exit_code } => {
                    return Ok(CommandResult {
                        request_id: self.request.id,
                        output_lines,
                        exit_code,
                    });
                }
                CommandEvent::Aborted { reason } => {
                    return Err(Error::CommandAborted {
                        command: self.request.command_text.clone(),
                        reason,
                    });
                }
            }
        }

        Err(Error::CommandAborted {
            command: self.request.command_text.clone(),
            reason: "output channel closed before completion".to_string(),
        })
    }
}

impl Stream for CommandStream {
    type Item = CommandEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.events.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                if !matches!(event, CommandEvent::Output(_)) {
                    self.finished = true;
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for CommandStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandStream")
            .field("request", &self.request)
            .field("finished", &self.finished)
            .finish()
    }
}

/// Operations for running commands through a privileged shell
///
/// Implementations run one command at a time; concurrent submitters are
/// queued in submission order.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Hand a request to the shell.
    ///
    /// # Errors
    /// Returns `CommandSubmissionFailed` immediately when the shell cannot
    /// accept the command. Failures after submission arrive through the stream.
    async fn submit(&self, request: CommandRequest) -> Result<CommandStream>;

    /// Upper bound on how long [`run`](Self::run) waits for completion
    fn command_timeout(&self) -> Option<Duration> {
        None
    }

    /// Stop whatever the executor is running so queued commands can proceed.
    ///
    /// Called by [`run`](Self::run) after a timeout. The default does nothing.
    async fn interrupt(&self) {}

    /// Submit a request and wait for its full result.
    ///
    /// The timeout covers waiting for the shell as well as the command
    /// itself. On expiry the executor is interrupted before
    /// `CommandTimeout` is returned.
    async fn run(&self, request: CommandRequest) -> Result<CommandResult> {
        let Some(limit) = self.command_timeout() else {
            return self.submit(request).await?.collect_result().await;
        };

        let command = request.command_text.clone();
        let attempt = async { self.submit(request).await?.collect_result().await };
        match tokio::time::timeout(limit, attempt).await {
            Ok(result) => result,
            Err(_) => {
                warn!("'{}' timed out after {:?}, interrupting", command, limit);
                self.interrupt().await;
                Err(Error::CommandTimeout {
                    command,
                    duration: limit,
                })
            }
        }
    }

    /// Run requests one after another, stopping at the first failure
    async fn run_chain(&self, requests: Vec<CommandRequest>) -> Result<Vec<CommandResult>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.run(request).await?);
        }
        Ok(results)
    }
}

#[async_trait]
impl<T: CommandExecutor + ?Sized> CommandExecutor for Arc<T> {
    async fn submit(&self, request: CommandRequest) -> Result<CommandStream> {
        (**self).submit(request).await
    }

    fn command_timeout(&self) -> Option<Duration> {
        (**self).command_timeout()
    }

    async fn interrupt(&self) {
        (**self).interrupt().await
    }
}

/// Allocator for caller-assigned request identifiers
#[derive(Debug, Default)]
pub struct RequestIds {
    next: AtomicU32,
}

impl RequestIds {
    /// Start allocating from zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused identifier
    pub fn next_id(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Build a request with the next identifier
    pub fn request(&self, command_text: impl Into<String>) -> CommandRequest {
        CommandRequest::new(self.next_id(), command_text)
    }
}
