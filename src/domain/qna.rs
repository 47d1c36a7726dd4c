//! One conversational turn: image, question, answer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque reference to the image a dialog is about.
///
/// Usually a `data:` URL produced by a webcam capture or a gallery pick.
/// The engine never inspects it; it is forwarded verbatim with the first
/// question of a dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wraps an image reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ImageRef {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

impl From<String> for ImageRef {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

/// State of a turn's answer.
///
/// An answer leaves `Pending` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum Answer {
    /// Waiting for the backend to start or finish the stream.
    Pending,
    /// The assembled stream text, verbatim.
    Final(String),
    /// The backend reported an error for this turn.
    Failed(String),
}

impl Answer {
    /// Returns `true` while the answer has not been settled.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns the final answer text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Final(text) => Some(text),
            Self::Pending | Self::Failed(_) => None,
        }
    }
}

/// One question/answer pair in the dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QnA {
    /// Image sent with this question. Only the first turn carries one.
    pub image: Option<ImageRef>,

    /// The question text (never empty).
    pub question: String,

    /// Answer state.
    pub answer: Answer,

    /// When the question was asked.
    pub asked_at: DateTime<Utc>,

    /// When the answer was settled.
    pub answered_at: Option<DateTime<Utc>>,
}

impl QnA {
    /// Creates a turn with a pending answer.
    #[must_use]
    pub fn new(question: String, image: Option<ImageRef>) -> Self {
        Self {
            image,
            question,
            answer: Answer::Pending,
            asked_at: Utc::now(),
            answered_at: None,
        }
    }
}
