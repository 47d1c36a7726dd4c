//! Notifications published to observers after every state change.
//!
//! Each applied action or inbound event emits zero or more
//! [`SessionUpdate`]s through the [`super::UpdateBus`]. Presentation layers
//! use them for incremental rendering (e.g. appending a token) and read the
//! full picture from the latest [`super::SessionSnapshot`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::SessionId;

/// Observer notification describing one state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "update_type", rename_all = "snake_case")]
pub enum SessionUpdate {
    /// The channel to the backend opened.
    Connected {
        /// Session identifier minted for this connection.
        session_id: SessionId,
        /// Connection timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The channel to the backend closed.
    Disconnected {
        /// Session that was closed.
        session_id: Option<SessionId>,
        /// Disconnection timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The backend reported its queue depth.
    QueueDepth {
        /// Requests queued ahead.
        depth: u32,
    },

    /// A question was appended to the dialog.
    QuestionAsked {
        /// Index of the new turn.
        index: usize,
        /// Question text.
        question: String,
        /// Whether the image was sent with it.
        with_image: bool,
    },

    /// The answer stream for the pending turn began.
    StreamStarted,

    /// A token was appended to the partial answer.
    TokenAppended {
        /// The fragment just received.
        fragment: String,
        /// Length of the partial answer in bytes after appending.
        partial_len: usize,
    },

    /// The pending turn received its final answer.
    AnswerFinalized {
        /// Index of the settled turn.
        index: usize,
        /// The complete answer text.
        answer: String,
        /// Whether the stream was aborted.
        aborted: bool,
    },

    /// The pending turn failed on the backend.
    AnswerFailed {
        /// Index of the settled turn.
        index: usize,
        /// Backend error message.
        message: String,
    },

    /// An abort was requested; the stream keeps running until `end`.
    AbortRequested,

    /// The dialog was cleared.
    DialogReset {
        /// Whether a `reset` command was sent to the backend.
        remote: bool,
    },

    /// The selected image changed.
    ImageSelectionChanged {
        /// Whether an image is selected now.
        selected: bool,
    },

    /// The pending-input text changed.
    DraftChanged,

    /// The backend finished preprocessing the image.
    ImageProcessed,

    /// The backend reported an error.
    BackendError {
        /// Backend error message.
        message: String,
    },

    /// An inbound event was discarded as out of order.
    ProtocolViolation {
        /// Wire name of the discarded event.
        event: &'static str,
        /// Why it was discarded.
        reason: String,
    },
}

impl SessionUpdate {
    /// Returns the update type as a static string slice.
    #[must_use]
    pub const fn update_type_str(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Disconnected { .. } => "disconnected",
            Self::QueueDepth { .. } => "queue_depth",
            Self::QuestionAsked { .. } => "question_asked",
            Self::StreamStarted => "stream_started",
            Self::TokenAppended { .. } => "token_appended",
            Self::AnswerFinalized { .. } => "answer_finalized",
            Self::AnswerFailed { .. } => "answer_failed",
            Self::AbortRequested => "abort_requested",
            Self::DialogReset { .. } => "dialog_reset",
            Self::ImageSelectionChanged { .. } => "image_selection_changed",
            Self::DraftChanged => "draft_changed",
            Self::ImageProcessed => "image_processed",
            Self::BackendError { .. } => "backend_error",
            Self::ProtocolViolation { .. } => "protocol_violation",
        }
    }
}
