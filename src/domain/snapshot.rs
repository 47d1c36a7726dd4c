//! Read-only view of the session handed to the presentation layer.

use serde::Serialize;

use super::{ImageRef, QnA, SessionId};

/// Point-in-time copy of everything a UI needs to render the chat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Current session, if connected at least once.
    pub session_id: Option<SessionId>,
    /// Whether the channel is open and actions are accepted.
    pub connected: bool,
    /// Last queue depth reported by the backend.
    pub queue_depth: u32,
    /// Whether an answer is being streamed into the last turn.
    pub is_streaming: bool,
    /// Tokens received so far for the streaming answer.
    pub partial_answer: Option<String>,
    /// All turns in conversation order.
    pub dialog: Vec<QnA>,
    /// Image that will accompany the first question.
    pub selected_image: Option<ImageRef>,
    /// Pending input text.
    pub draft: String,
    /// Whether the backend acknowledged processing the image.
    pub image_processed: bool,
    /// Most recent backend error message.
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// Returns `true` when a new question would be accepted.
    ///
    /// Mirrors the coordinator's `ask` checks except for the question text.
    #[must_use]
    pub fn can_ask(&self) -> bool {
        let pending = self.dialog.last().is_some_and(|qna| qna.answer.is_pending());
        let has_image = !self.dialog.is_empty() || self.selected_image.is_some();
        self.connected && !pending && has_image
    }
}
