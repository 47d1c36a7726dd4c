//! Client error types and the failure taxonomy.
//!
//! [`ClientError`] is the central error type for the crate. The narrower
//! enums ([`ActionRejected`], [`ProtocolViolation`], [`DialogError`]) are
//! produced by the session core and are never fatal: the engine logs them
//! and keeps running.

use tokio_tungstenite::tungstenite;

/// Coarse failure category used by callers to decide how to react.
///
/// | Kind            | Typical cause                         | Recovery            |
/// |-----------------|---------------------------------------|---------------------|
/// | `Connectivity`  | socket closed, handshake failed       | external reconnect  |
/// | `Protocol`      | out-of-order or malformed event       | discarded locally   |
/// | `InvalidAction` | empty question, ask while answering   | none needed         |
/// | `Configuration` | bad endpoint or origin                | fix the environment |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The channel to the backend is unavailable.
    Connectivity,
    /// The backend sent something the engine could not apply.
    Protocol,
    /// A user action was rejected at the coordinator boundary.
    InvalidAction,
    /// Startup configuration is invalid.
    Configuration,
}

/// Crate-level error enum.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// WebSocket handshake or transport failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// The session loop has stopped; no further actions are accepted.
    #[error("connection closed")]
    ConnectionClosed,

    /// The backend endpoint could not be derived or parsed.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A frame was not a valid event envelope.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A well-formed envelope named an event the client does not know.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An inbound event arrived out of order.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// A user action was refused.
    #[error("action rejected: {0}")]
    Rejected(#[from] ActionRejected),
}

impl ClientError {
    /// Returns the taxonomy bucket for this variant.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::WebSocket(_) | Self::ConnectionClosed => ErrorKind::Connectivity,
            Self::MalformedFrame(_)
            | Self::UnknownEvent(_)
            | Self::Serialization(_)
            | Self::Protocol(_) => ErrorKind::Protocol,
            Self::Rejected(_) => ErrorKind::InvalidAction,
            Self::InvalidEndpoint(_) => ErrorKind::Configuration,
        }
    }
}

/// Reasons the action coordinator refuses a user action.
///
/// A rejected action sends nothing to the backend and leaves the session
/// state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActionRejected {
    /// `ask` was called with an empty question.
    #[error("question is empty")]
    EmptyQuestion,
    /// The channel to the backend is down.
    #[error("not connected")]
    NotConnected,
    /// The last question is still waiting for (or receiving) its answer.
    #[error("an answer is still pending")]
    AnswerPending,
    /// `abort` was called with no active stream.
    #[error("no stream is active")]
    NotStreaming,
    /// The first question of a dialog needs a selected image.
    #[error("no image selected for the first question")]
    NoImage,
}

/// Inbound events that contradict the current stream state.
///
/// The dispatcher discards the offending event; the dialog is not touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    /// `start` arrived while a stream was already active.
    #[error("stream start while a stream is active")]
    StartWhileStreaming,
    /// `start` arrived with no outstanding question.
    #[error("stream start without an outstanding question")]
    StartWithoutQuestion,
    /// `token` arrived with no active stream.
    #[error("token without an active stream")]
    TokenWithoutStream,
    /// `end` arrived with no active stream.
    #[error("stream end without an active stream")]
    EndWithoutStream,
}

/// Inconsistencies reported by the dialog store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DialogError {
    /// There is no entry to settle.
    #[error("dialog is empty")]
    Empty,
    /// The last entry already has a final answer.
    #[error("entry {index} is already settled")]
    AlreadySettled {
        /// Index of the entry that was already settled.
        index: usize,
    },
}
