//! Operation Event System
//!
//! Completion notifications for listings and mutations. Callers that prefer
//! not to await an operation directly subscribe here instead.

use std::path::PathBuf;
use tokio::sync::broadcast;

use crate::models::InventoryEntry;

/// Events emitted when an operation completes
#[derive(Debug, Clone, PartialEq)]
pub enum OperationEvent {
    /// A directory listing finished
    InventoryReady {
        /// Directory that was listed
        path: PathBuf,
        /// Entries in enumeration order
        entries: Vec<InventoryEntry>,
    },
    /// A create or delete finished
    MutationComplete {
        /// Target path (the first path for a batch delete)
        path: String,
        /// Whether the shell reported exit code 0
        success: bool,
    },
}

/// Subscription handle for receiving operation events
pub struct OperationEventSubscription {
    receiver: broadcast::Receiver<OperationEvent>,
}

impl OperationEventSubscription {
    /// Receive the next event, waiting if necessary
    pub async fn recv(&mut self) -> Option<OperationEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("Operation event subscriber lagged by {} events", count);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Option<OperationEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => return None,
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!("Operation event subscriber lagged by {} events", count);
                }
            }
        }
    }
}

/// Event bus for publishing and subscribing to operation events
#[derive(Clone)]
pub struct OperationEventBus {
    sender: broadcast::Sender<OperationEvent>,
}

impl OperationEventBus {
    /// Create a new event bus with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to operation events published from now on
    pub fn subscribe(&self) -> OperationEventSubscription {
        OperationEventSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: OperationEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for OperationEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for OperationEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
