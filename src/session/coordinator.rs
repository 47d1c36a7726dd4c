//! Validates user actions against the session state.
//!
//! Every accepted action mutates the state immediately and may produce one
//! outbound command. A rejected action returns [`ActionRejected`] and
//! changes nothing.

use crate::domain::{ImageRef, OutboundCommand, SessionUpdate};
use crate::error::ActionRejected;

use super::state::SessionState;
use super::transition::Transition;

/// Action initiated by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Ask a question about the selected image.
    Ask(String),
    /// Send button: abort while streaming, otherwise ask the draft.
    Submit,
    /// Request cancellation of the active stream.
    Abort,
    /// Clear the conversation locally and on the backend.
    Reset,
    /// Select the image for the next dialog.
    SelectImage(ImageRef),
    /// Drop the selected image.
    ClearImage,
    /// Replace the pending input text.
    SetDraft(String),
}

/// Applies a user action.
///
/// # Errors
///
/// Returns the [`ActionRejected`] reason of the specific action.
pub fn apply(state: &mut SessionState, action: UserAction) -> Result<Transition, ActionRejected> {
    match action {
        UserAction::Ask(question) => ask(state, question),
        UserAction::Submit => submit(state),
        UserAction::Abort => abort(state),
        UserAction::Reset => reset(state),
        UserAction::SelectImage(image) => Ok(select_image(state, image)),
        UserAction::ClearImage => Ok(clear_image(state)),
        UserAction::SetDraft(text) => Ok(set_draft(state, text)),
    }
}

/// Appends a pending turn and emits `ask`.
///
/// Only the first turn of a dialog carries the selected image.
///
/// # Errors
///
/// - [`ActionRejected::EmptyQuestion`] if `question` is empty.
/// - [`ActionRejected::NotConnected`] if the channel is down.
/// - [`ActionRejected::AnswerPending`] while the previous answer is still
///   awaited or streaming.
/// - [`ActionRejected::NoImage`] if the dialog is empty and no image is
///   selected.
pub fn ask(state: &mut SessionState, question: String) -> Result<Transition, ActionRejected> {
    if question.is_empty() {
        return Err(ActionRejected::EmptyQuestion);
    }
    if !state.connected {
        return Err(ActionRejected::NotConnected);
    }
    if state.stream.is_streaming() || state.dialog.has_pending() {
        return Err(ActionRejected::AnswerPending);
    }
    let image = if state.dialog.is_empty() {
        Some(
            state
                .selected_image
                .clone()
                .ok_or(ActionRejected::NoImage)?,
        )
    } else {
        None
    };

    let index = state.dialog.append(question.clone(), image.clone());
    state.draft.clear();
    state.awaiting_start.push_back(state.epoch);
    tracing::info!(index, epoch = state.epoch, with_image = image.is_some(), "question asked");

    Ok(Transition::update(SessionUpdate::QuestionAsked {
        index,
        question: question.clone(),
        with_image: image.is_some(),
    })
    .with_command(OutboundCommand::Ask { question, image }))
}

/// Emits `abort` for the active stream.
///
/// The dialog is not touched; the answer is settled by the `end` event
/// that follows.
///
/// # Errors
///
/// [`ActionRejected::NotConnected`] or [`ActionRejected::NotStreaming`].
pub fn abort(state: &mut SessionState) -> Result<Transition, ActionRejected> {
    if !state.connected {
        return Err(ActionRejected::NotConnected);
    }
    if !state.stream.is_streaming() {
        return Err(ActionRejected::NotStreaming);
    }
    tracing::info!("abort requested");
    Ok(Transition::update(SessionUpdate::AbortRequested).with_command(OutboundCommand::Abort))
}

/// Clears the dialog, buffer, and selected image.
///
/// Does not wait for the backend. `reset` is sent only if the dialog had
/// turns.
///
/// # Errors
///
/// [`ActionRejected::NotConnected`] if the channel is down.
pub fn reset(state: &mut SessionState) -> Result<Transition, ActionRejected> {
    if !state.connected {
        return Err(ActionRejected::NotConnected);
    }
    Ok(reset_unchecked(state))
}

/// Reset without the connectivity check, used when a connection opens.
pub(crate) fn reset_unchecked(state: &mut SessionState) -> Transition {
    let remote = !state.dialog.is_empty();
    state.clear_conversation();
    tracing::info!(remote, epoch = state.epoch, "dialog reset");

    let transition = Transition::update(SessionUpdate::DialogReset { remote });
    if remote {
        transition.with_command(OutboundCommand::Reset)
    } else {
        transition
    }
}

/// Send-button behaviour: abort while streaming, otherwise ask the draft.
///
/// # Errors
///
/// Whatever [`abort`] or [`ask`] return.
pub fn submit(state: &mut SessionState) -> Result<Transition, ActionRejected> {
    if state.stream.is_streaming() {
        abort(state)
    } else {
        let question = state.draft.clone();
        ask(state, question)
    }
}

/// Selects the image sent with the first question.
pub fn select_image(state: &mut SessionState, image: ImageRef) -> Transition {
    state.selected_image = Some(image);
    Transition::update(SessionUpdate::ImageSelectionChanged { selected: true })
}

/// Drops the selected image.
pub fn clear_image(state: &mut SessionState) -> Transition {
    state.selected_image = None;
    Transition::update(SessionUpdate::ImageSelectionChanged { selected: false })
}

/// Replaces the pending input text.
pub fn set_draft(state: &mut SessionState, text: String) -> Transition {
    state.draft = text;
    Transition::update(SessionUpdate::DraftChanged)
}
