//! Session engine: the single owner and writer of session state.

use chrono::Utc;

use crate::domain::{InboundEvent, OutboundCommand, SessionId, SessionUpdate, UpdateBus};
use crate::error::ActionRejected;

use super::coordinator::{self, UserAction};
use super::dispatcher;
use super::state::SessionState;
use super::transition::Transition;

/// Owns the [`SessionState`] and publishes every change.
///
/// Every method follows the same pattern: apply the action or event to the
/// state → publish updates → publish a fresh snapshot → return the command
/// (if any) for the transport to send. The engine never blocks and holds
/// no locks; callers serialize access by driving it from one task.
#[derive(Debug)]
pub struct DialogEngine {
    state: SessionState,
    bus: UpdateBus,
}

impl DialogEngine {
    /// Creates an engine for a disconnected, empty session.
    #[must_use]
    pub fn new(bus: UpdateBus) -> Self {
        Self {
            state: SessionState::new(),
            bus,
        }
    }

    /// Read access to the session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// The observer bus.
    #[must_use]
    pub const fn bus(&self) -> &UpdateBus {
        &self.bus
    }

    /// Marks the session connected and performs the implicit reset.
    ///
    /// Returns `reset` if the dialog from a previous connection was not
    /// empty.
    pub fn connected(&mut self, session_id: SessionId) -> Option<OutboundCommand> {
        self.state.session_id = Some(session_id);
        self.state.connected = true;

        let reset = coordinator::reset_unchecked(&mut self.state);
        // A fresh channel carries no leftovers from the old one.
        self.state.stream.finish();
        self.state.awaiting_start.clear();
        tracing::info!(%session_id, "session connected");

        self.bus.publish(SessionUpdate::Connected {
            session_id,
            timestamp: Utc::now(),
        });
        self.commit(reset)
    }

    /// Marks the session disconnected. Finalized turns are kept.
    pub fn disconnected(&mut self) {
        if !self.state.connected {
            return;
        }
        self.state.connected = false;
        tracing::info!(
            session_id = ?self.state.session_id,
            streaming = self.state.is_streaming(),
            "session disconnected"
        );
        let update = SessionUpdate::Disconnected {
            session_id: self.state.session_id,
            timestamp: Utc::now(),
        };
        let _ = self.commit(Transition::update(update));
    }

    /// Applies a backend event. Out-of-order events are logged and dropped.
    pub fn handle_event(&mut self, event: InboundEvent) {
        let name = event.name();
        match dispatcher::dispatch(&mut self.state, event) {
            Ok(transition) => {
                let _ = self.commit(transition);
            }
            Err(violation) => {
                tracing::warn!(event = name, %violation, "discarding out-of-order event");
                self.bus.publish(SessionUpdate::ProtocolViolation {
                    event: name,
                    reason: violation.to_string(),
                });
            }
        }
    }

    /// Applies a user action and returns the command to send, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ActionRejected`] when the coordinator refuses the action;
    /// nothing is published in that case.
    pub fn perform(&mut self, action: UserAction) -> Result<Option<OutboundCommand>, ActionRejected> {
        match coordinator::apply(&mut self.state, action) {
            Ok(transition) => Ok(self.commit(transition)),
            Err(rejected) => {
                tracing::debug!(%rejected, "action rejected");
                Err(rejected)
            }
        }
    }

    fn commit(&mut self, transition: Transition) -> Option<OutboundCommand> {
        for update in transition.updates {
            self.bus.publish(update);
        }
        self.bus.publish_snapshot(self.state.snapshot());
        transition.command
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Answer, ImageRef};

    fn connected_engine() -> DialogEngine {
        let mut engine = DialogEngine::new(UpdateBus::new(64));
        assert_eq!(engine.connected(SessionId::new()), None);
        engine
    }

    fn feed(engine: &mut DialogEngine, events: Vec<InboundEvent>) {
        for event in events {
            engine.handle_event(event);
        }
    }

    #[test]
    fn end_to_end_single_turn() {
        let mut engine = connected_engine();
        let image = ImageRef::from("data:image/jpeg;base64,A");
        assert!(engine.perform(UserAction::SelectImage(image.clone())).is_ok());

        let Ok(Some(command)) = engine.perform(UserAction::Ask("how many people?".to_string()))
        else {
            panic!("ask rejected");
        };
        assert_eq!(
            command,
            OutboundCommand::Ask {
                question: "how many people?".to_string(),
                image: Some(image.clone()),
            }
        );

        let snapshot = engine.bus().snapshot();
        assert_eq!(snapshot.dialog.len(), 1);
        assert!(snapshot.dialog.first().is_some_and(|q| q.answer.is_pending()));

        feed(
            &mut engine,
            vec![
                InboundEvent::StreamStart,
                InboundEvent::Token("Two".to_string()),
                InboundEvent::Token(" people.".to_string()),
                InboundEvent::StreamEnd { aborted: false },
            ],
        );

        let snapshot = engine.bus().snapshot();
        assert!(!snapshot.is_streaming);
        let Some(turn) = snapshot.dialog.first() else {
            panic!("dialog is empty");
        };
        assert_eq!(turn.image.as_ref(), Some(&image));
        assert_eq!(turn.question, "how many people?");
        assert_eq!(turn.answer, Answer::Final("Two people.".to_string()));
    }

    #[tokio::test]
    async fn token_updates_reach_observers() {
        let mut engine = connected_engine();
        let mut rx = engine.bus().subscribe();
        let _ = engine.perform(UserAction::SelectImage(ImageRef::from("img")));
        let _ = engine.perform(UserAction::Ask("q".to_string()));
        feed(
            &mut engine,
            vec![InboundEvent::StreamStart, InboundEvent::Token("Tw".to_string())],
        );

        let mut seen = Vec::new();
        while let Ok(update) = rx.try_recv() {
            seen.push(update.update_type_str());
        }
        assert_eq!(
            seen,
            vec![
                "image_selection_changed",
                "question_asked",
                "stream_started",
                "token_appended"
            ]
        );
        assert_eq!(
            engine.bus().snapshot().partial_answer.as_deref(),
            Some("Tw")
        );
    }

    #[test]
    fn violation_is_published_not_applied() {
        let mut engine = connected_engine();
        let mut rx = engine.bus().subscribe();

        engine.handle_event(InboundEvent::Token("stray".to_string()));

        let Ok(SessionUpdate::ProtocolViolation { event, .. }) = rx.try_recv() else {
            panic!("expected a protocol violation update");
        };
        assert_eq!(event, "token");
        assert!(engine.state().dialog().is_empty());
    }

    #[test]
    fn rejected_action_publishes_nothing() {
        let mut engine = connected_engine();
        let mut rx = engine.bus().subscribe();
        assert_eq!(
            engine.perform(UserAction::Ask(String::new())),
            Err(ActionRejected::EmptyQuestion)
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn reconnect_resets_non_empty_dialog() {
        let mut engine = connected_engine();
        let _ = engine.perform(UserAction::SelectImage(ImageRef::from("img")));
        let _ = engine.perform(UserAction::Ask("q".to_string()));
        engine.handle_event(InboundEvent::StreamStart);
        engine.handle_event(InboundEvent::Token("half".to_string()));

        engine.disconnected();
        assert!(!engine.bus().snapshot().connected);
        assert_eq!(engine.state().dialog().len(), 1);
        assert_eq!(
            engine.perform(UserAction::Abort),
            Err(ActionRejected::NotConnected)
        );

        assert_eq!(engine.connected(SessionId::new()), Some(OutboundCommand::Reset));
        assert!(engine.state().dialog().is_empty());
        assert!(engine.state().stream().is_idle());

        // Nothing from the old channel can arrive on the new one.
        engine.handle_event(InboundEvent::StreamEnd { aborted: true });
        assert!(engine.state().dialog().is_empty());
    }

    #[test]
    fn reset_then_late_events_keep_dialog_empty() {
        let mut engine = connected_engine();
        let _ = engine.perform(UserAction::SelectImage(ImageRef::from("img")));
        let _ = engine.perform(UserAction::Ask("q".to_string()));
        engine.handle_event(InboundEvent::StreamStart);
        engine.handle_event(InboundEvent::Token("par".to_string()));

        assert_eq!(engine.perform(UserAction::Reset), Ok(Some(OutboundCommand::Reset)));
        feed(
            &mut engine,
            vec![
                InboundEvent::Token("tial".to_string()),
                InboundEvent::StreamEnd { aborted: true },
            ],
        );

        let snapshot = engine.bus().snapshot();
        assert!(snapshot.dialog.is_empty());
        assert!(snapshot.partial_answer.is_none());
        assert!(snapshot.selected_image.is_none());
    }
}
