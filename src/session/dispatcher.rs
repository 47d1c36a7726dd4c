//! Applies inbound backend events to the session state.
//!
//! Events are handled strictly in arrival order. An event that contradicts
//! the stream state is returned as a [`ProtocolViolation`] and has no
//! effect; the caller logs it and carries on.

use crate::domain::{InboundEvent, SessionUpdate};
use crate::error::ProtocolViolation;

use super::state::SessionState;
use super::transition::Transition;

/// Applies one inbound event.
///
/// # Errors
///
/// Returns a [`ProtocolViolation`] when the event is out of order:
/// `start` during a stream or with no outstanding question, and `token` or
/// `end` without a stream. The state is left untouched in that case.
pub fn dispatch(
    state: &mut SessionState,
    event: InboundEvent,
) -> Result<Transition, ProtocolViolation> {
    match event {
        InboundEvent::QueueDepth(depth) => {
            state.queue_depth = depth;
            Ok(Transition::update(SessionUpdate::QueueDepth { depth }))
        }
        InboundEvent::StreamStart => on_start(state),
        InboundEvent::Token(fragment) => on_token(state, fragment),
        InboundEvent::StreamEnd { aborted } => on_end(state, aborted),
        InboundEvent::Error { message } => Ok(on_error(state, message)),
        InboundEvent::ImageProcessed => {
            state.image_processed = true;
            Ok(Transition::update(SessionUpdate::ImageProcessed))
        }
    }
}

fn on_start(state: &mut SessionState) -> Result<Transition, ProtocolViolation> {
    if state.stream.is_streaming() {
        return Err(ProtocolViolation::StartWhileStreaming);
    }
    if state.stream.is_draining() {
        // The discarded stream's end was never delivered.
        tracing::warn!("stream start while draining; dropping the discarded stream");
        state.stream.finish();
    }
    let Some(epoch) = state.awaiting_start.pop_front() else {
        return Err(ProtocolViolation::StartWithoutQuestion);
    };

    if epoch != state.epoch || !state.dialog.has_pending() {
        tracing::debug!(epoch, current = state.epoch, "draining stream of a reset dialog");
        state.stream.drain();
        return Ok(Transition::none());
    }

    state.stream.start();
    Ok(Transition::update(SessionUpdate::StreamStarted))
}

fn on_token(state: &mut SessionState, fragment: String) -> Result<Transition, ProtocolViolation> {
    if state.stream.is_draining() {
        return Ok(Transition::none());
    }
    if !state.stream.push(&fragment) {
        return Err(ProtocolViolation::TokenWithoutStream);
    }
    let partial_len = state.stream.buffer().map_or(0, str::len);
    Ok(Transition::update(SessionUpdate::TokenAppended {
        fragment,
        partial_len,
    }))
}

fn on_end(state: &mut SessionState, aborted: bool) -> Result<Transition, ProtocolViolation> {
    if state.stream.is_idle() {
        return Err(ProtocolViolation::EndWithoutStream);
    }
    let Some(answer) = state.stream.finish() else {
        tracing::debug!(aborted, "discarded stream ended");
        return Ok(Transition::none());
    };

    match state.dialog.finalize(answer.clone()) {
        Ok(index) => {
            tracing::info!(index, aborted, len = answer.len(), "answer finalized");
            Ok(Transition::update(SessionUpdate::AnswerFinalized {
                index,
                answer,
                aborted,
            }))
        }
        Err(err) => {
            tracing::warn!(%err, "stream ended without a pending turn");
            Ok(Transition::none())
        }
    }
}

fn on_error(state: &mut SessionState, message: String) -> Transition {
    tracing::warn!(%message, "backend reported an error");
    state.last_error = Some(message.clone());

    // The error belongs to the live stream or, failing that, to the oldest
    // question still waiting for its start.
    let owns_pending_turn = if state.stream.is_idle() {
        state.awaiting_start.pop_front() == Some(state.epoch)
    } else {
        state.stream.finish().is_some()
    };

    let mut transition = Transition::none();
    if owns_pending_turn && let Ok(index) = state.dialog.fail(message.clone()) {
        transition = transition.with_update(SessionUpdate::AnswerFailed {
            index,
            message: message.clone(),
        });
    }
    transition.with_update(SessionUpdate::BackendError { message })
}
