//! Observer channels for session changes.
//!
//! [`UpdateBus`] wraps a [`tokio::sync::broadcast`] channel of
//! [`SessionUpdate`]s and a [`tokio::sync::watch`] channel holding the
//! latest [`SessionSnapshot`]. The session loop is the only publisher.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use super::{SessionSnapshot, SessionUpdate};

/// Broadcast bus for [`SessionUpdate`]s plus the latest snapshot.
///
/// When the broadcast ring buffer is full, the oldest updates are dropped
/// for lagging receivers; the snapshot channel always holds the newest
/// state, so a lagging observer can resynchronize from it.
#[derive(Debug, Clone)]
pub struct UpdateBus {
    sender: broadcast::Sender<SessionUpdate>,
    snapshot: Arc<watch::Sender<SessionSnapshot>>,
}

impl UpdateBus {
    /// Creates a new `UpdateBus` with the given broadcast capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        Self {
            sender,
            snapshot: Arc::new(snapshot),
        }
    }

    /// Publishes an update to all subscribers.
    ///
    /// Returns the number of receivers that received the update.
    /// If there are no active receivers, the update is silently dropped.
    pub fn publish(&self, update: SessionUpdate) -> usize {
        self.sender.send(update).unwrap_or(0)
    }

    /// Replaces the latest snapshot, waking every snapshot watcher.
    pub fn publish_snapshot(&self, snapshot: SessionSnapshot) {
        self.snapshot.send_replace(snapshot);
    }

    /// Creates a receiver for all future updates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.sender.subscribe()
    }

    /// Creates a watcher of the latest snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Returns a copy of the latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Returns the current number of update receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
