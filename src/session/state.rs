//! Owned session state.
//!
//! [`SessionState`] is mutated only by the dispatcher and the coordinator,
//! both running inside the session loop. Everything else reads it through
//! [`SessionState::snapshot`].

use std::collections::VecDeque;

use crate::domain::{DialogStore, ImageRef, SessionId, SessionSnapshot, StreamState};

/// All mutable state of one client session.
#[derive(Debug, Default)]
pub struct SessionState {
    pub(crate) session_id: Option<SessionId>,
    pub(crate) connected: bool,
    pub(crate) dialog: DialogStore,
    pub(crate) stream: StreamState,
    pub(crate) queue_depth: u32,
    pub(crate) selected_image: Option<ImageRef>,
    pub(crate) draft: String,
    pub(crate) image_processed: bool,
    pub(crate) last_error: Option<String>,
    /// Bumped by every reset. Questions and streams from an older epoch
    /// belong to a discarded dialog.
    pub(crate) epoch: u64,
    /// Epochs of questions sent whose stream has not started yet, oldest
    /// first. The backend serves questions in order.
    pub(crate) awaiting_start: VecDeque<u64>,
}

impl SessionState {
    /// Creates a disconnected, empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier of the current connection.
    #[must_use]
    pub const fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    /// Whether actions are accepted.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether an answer is being streamed into the last turn.
    #[must_use]
    pub const fn is_streaming(&self) -> bool {
        self.stream.is_streaming()
    }

    /// The dialog history.
    #[must_use]
    pub const fn dialog(&self) -> &DialogStore {
        &self.dialog
    }

    /// The stream phase.
    #[must_use]
    pub const fn stream(&self) -> &StreamState {
        &self.stream
    }

    /// Last reported queue depth.
    #[must_use]
    pub const fn queue_depth(&self) -> u32 {
        self.queue_depth
    }

    /// Image that will accompany the first question.
    #[must_use]
    pub const fn selected_image(&self) -> Option<&ImageRef> {
        self.selected_image.as_ref()
    }

    /// Pending input text.
    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Current reset generation.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Clears the dialog, stream buffer, and selected image, and starts a
    /// new epoch. A live stream keeps draining until its end arrives.
    pub(crate) fn clear_conversation(&mut self) {
        self.dialog.clear();
        self.stream.orphan();
        self.selected_image = None;
        self.image_processed = false;
        self.last_error = None;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Builds a read-only copy for observers.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            connected: self.connected,
            queue_depth: self.queue_depth,
            is_streaming: self.stream.is_streaming(),
            partial_answer: self.stream.buffer().map(str::to_string),
            dialog: self.dialog.entries().to_vec(),
            selected_image: self.selected_image.clone(),
            draft: self.draft.clone(),
            image_processed: self.image_processed,
            last_error: self.last_error.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn clear_conversation_bumps_epoch_and_orphans_stream() {
        let mut state = SessionState::new();
        state.dialog.append("q".to_string(), Some(ImageRef::from("img")));
        state.selected_image = Some(ImageRef::from("img"));
        state.stream.start();
        state.stream.push("par");

        state.clear_conversation();

        assert!(state.dialog().is_empty());
        assert!(state.selected_image().is_none());
        assert!(state.stream().is_draining());
        assert!(!state.is_streaming());
        assert_eq!(state.epoch(), 1);
    }

    #[test]
    fn snapshot_exposes_partial_answer() {
        let mut state = SessionState::new();
        state.connected = true;
        state.dialog.append("q".to_string(), Some(ImageRef::from("img")));
        state.stream.start();
        state.stream.push("Tw");

        let snapshot = state.snapshot();
        assert!(snapshot.is_streaming);
        assert_eq!(snapshot.partial_answer.as_deref(), Some("Tw"));
        assert_eq!(snapshot.dialog.len(), 1);
        assert!(!snapshot.can_ask());
    }
}
