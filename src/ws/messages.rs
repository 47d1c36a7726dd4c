//! Wire envelope: one JSON object per WebSocket text frame.
//!
//! ```json
//! { "event": "token", "args": ["Two"] }
//! ```
//!
//! `event` names the backend event or client command and `args` carries
//! its positional arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ImageRef, InboundEvent, OutboundCommand};
use crate::error::ClientError;

/// Top-level frame envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event or command name.
    pub event: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Envelope {
    fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    fn malformed(&self, expected: &str) -> ClientError {
        ClientError::MalformedFrame(format!("`{}` expects {expected}", self.event))
    }
}

/// Decodes a text frame into an [`InboundEvent`].
///
/// # Errors
///
/// Returns [`ClientError::Serialization`] for invalid JSON,
/// [`ClientError::MalformedFrame`] for missing or mistyped arguments, and
/// [`ClientError::UnknownEvent`] for names the client does not handle.
pub fn decode_event(text: &str) -> Result<InboundEvent, ClientError> {
    let envelope: Envelope = serde_json::from_str(text)?;

    match envelope.event.as_str() {
        "tasks" => envelope
            .arg(0)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .map(InboundEvent::QueueDepth)
            .ok_or_else(|| envelope.malformed("a non-negative integer")),
        "start" => Ok(InboundEvent::StreamStart),
        "token" => envelope
            .arg(0)
            .and_then(Value::as_str)
            .map(|fragment| InboundEvent::Token(fragment.to_string()))
            .ok_or_else(|| envelope.malformed("a string fragment")),
        "end" => envelope
            .arg(0)
            .and_then(Value::as_bool)
            .map(|aborted| InboundEvent::StreamEnd { aborted })
            .ok_or_else(|| envelope.malformed("an aborted flag")),
        "error" => {
            let message = match envelope.arg(0) {
                Some(Value::String(message)) => message.clone(),
                Some(payload) => payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown backend error")
                    .to_string(),
                None => "unknown backend error".to_string(),
            };
            Ok(InboundEvent::Error { message })
        }
        "image" => Ok(InboundEvent::ImageProcessed),
        _ => Err(ClientError::UnknownEvent(envelope.event)),
    }
}

/// Encodes an [`OutboundCommand`] as a text frame.
///
/// # Errors
///
/// Returns [`ClientError::Serialization`] if JSON encoding fails.
pub fn encode_command(command: &OutboundCommand) -> Result<String, ClientError> {
    let args = match command {
        OutboundCommand::Ask { question, image } => vec![
            Value::String(question.clone()),
            image
                .as_ref()
                .map_or(Value::Null, |image| Value::String(image.as_str().to_string())),
        ],
        OutboundCommand::Abort | OutboundCommand::Reset => Vec::new(),
    };
    let envelope = Envelope {
        event: command.name().to_string(),
        args,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes a command frame. Used by backends and test doubles.
///
/// # Errors
///
/// Same failure modes as [`decode_event`].
pub fn decode_command(text: &str) -> Result<OutboundCommand, ClientError> {
    let envelope: Envelope = serde_json::from_str(text)?;

    match envelope.event.as_str() {
        "ask" => {
            let question = envelope
                .arg(0)
                .and_then(Value::as_str)
                .ok_or_else(|| envelope.malformed("a question"))?
                .to_string();
            let image = envelope
                .arg(1)
                .and_then(Value::as_str)
                .map(ImageRef::from);
            Ok(OutboundCommand::Ask { question, image })
        }
        "abort" => Ok(OutboundCommand::Abort),
        "reset" => Ok(OutboundCommand::Reset),
        _ => Err(ClientError::UnknownEvent(envelope.event)),
    }
}

/// Encodes an [`InboundEvent`] as a text frame. Used by backends and test
/// doubles.
///
/// # Errors
///
/// Returns [`ClientError::Serialization`] if JSON encoding fails.
pub fn encode_event(event: &InboundEvent) -> Result<String, ClientError> {
    let args = match event {
        InboundEvent::QueueDepth(depth) => vec![Value::from(*depth)],
        InboundEvent::Token(fragment) => vec![Value::String(fragment.clone())],
        InboundEvent::StreamEnd { aborted } => vec![Value::Bool(*aborted)],
        InboundEvent::Error { message } => vec![serde_json::json!({ "message": message })],
        InboundEvent::StreamStart | InboundEvent::ImageProcessed => vec![serde_json::json!({})],
    };
    let envelope = Envelope {
        event: event.name().to_string(),
        args,
    };
    Ok(serde_json::to_string(&envelope)?)
}
