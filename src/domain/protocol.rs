//! Events received from and commands sent to the backend.
//!
//! These are transport-independent; `ws::messages` maps them to and from
//! wire frames.

use super::qna::ImageRef;

/// Event produced by the backend, in the order it was emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `tasks`: number of requests queued ahead on the backend.
    QueueDepth(u32),
    /// `start`: the answer stream for the oldest outstanding question began.
    StreamStart,
    /// `token`: next fragment of the answer.
    Token(String),
    /// `end`: the stream finished; `aborted` is metadata only.
    StreamEnd {
        /// Whether the stream was cut short by an abort.
        aborted: bool,
    },
    /// `error`: the backend could not serve the request.
    Error {
        /// Human-readable message from the backend.
        message: String,
    },
    /// `image`: the backend finished preprocessing the dialog's image.
    ImageProcessed,
}

impl InboundEvent {
    /// Wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::QueueDepth(_) => "tasks",
            Self::StreamStart => "start",
            Self::Token(_) => "token",
            Self::StreamEnd { .. } => "end",
            Self::Error { .. } => "error",
            Self::ImageProcessed => "image",
        }
    }
}

/// Command sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    /// Ask a question; the image is present only on the first turn.
    Ask {
        /// Question text.
        question: String,
        /// Image for the first turn of a dialog.
        image: Option<ImageRef>,
    },
    /// Cancel the active stream.
    Abort,
    /// Discard the server-side conversation.
    Reset,
}

impl OutboundCommand {
    /// Wire name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ask { .. } => "ask",
            Self::Abort => "abort",
            Self::Reset => "reset",
        }
    }
}
