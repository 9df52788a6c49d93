//! Session Manager
//!
//! Owns the one privileged shell of the process. The session is started on
//! first use, reused while it stays alive, and respawned transparently after
//! it exits. It is never torn down implicitly; call [`SessionManager::close`].
//!
//! The manager is itself a [`CommandExecutor`]: every submission goes to the
//! current session, so callers never hold on to a dead one.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;

use super::session::Session;
use crate::config::ShellConfig;
use crate::error::Result;
use crate::executor::{CommandExecutor, CommandStream};
use crate::models::CommandRequest;

/// Lazily started, reusable privileged shell
#[derive(Debug)]
pub struct SessionManager {
    config: ShellConfig,
    current: Mutex<Option<Session>>,
}

impl SessionManager {
    /// Create a manager; no process is spawned until the first acquisition
    pub fn new(config: ShellConfig) -> Self {
        Self {
            config,
            current: Mutex::new(None),
        }
    }

    /// Shell configuration in use
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Return the live session, starting one if needed
    ///
    /// # Errors
    /// `SessionUnavailable` when no privileged shell can be obtained.
    pub async fn acquire_session(&self) -> Result<Session> {
        let mut current = self.current.lock().await;

        if let Some(session) = current.as_ref() {
            if session.is_alive().await {
                return Ok(session.clone());
            }
            info!("Session {} has exited, starting a new one", session.id());
        }

        let session = Session::spawn(&self.config).await?;
        *current = Some(session.clone());
        Ok(session)
    }

    /// Whether a live session currently exists
    pub async fn has_live_session(&self) -> bool {
        match self.current.lock().await.as_ref() {
            Some(session) => session.is_alive().await,
            None => false,
        }
    }

    /// Close the current session, if any
    pub async fn close(&self) -> Result<()> {
        let session = self.current.lock().await.take();
        match session {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CommandExecutor for SessionManager {
    async fn submit(&self, request: CommandRequest) -> Result<CommandStream> {
        let session = self.acquire_session().await?;
        session.submit(request).await
    }

    fn command_timeout(&self) -> Option<Duration> {
        self.config.command_timeout()
    }

    /// Kill the current session; the next submission starts a fresh shell
    async fn interrupt(&self) {
        let session = self.current.lock().await.clone();
        if let Some(session) = session {
            session.interrupt().await;
        }
    }
}
