//! Result of applying one action or event to the session state.

use crate::domain::{OutboundCommand, SessionUpdate};

/// Command to send and updates to publish after a state change.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Transition {
    /// Command for the backend, if the change needs one.
    pub command: Option<OutboundCommand>,
    /// Notifications for observers, in order.
    pub updates: Vec<SessionUpdate>,
}

impl Transition {
    /// A transition with nothing to send or publish.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A transition publishing a single update.
    #[must_use]
    pub fn update(update: SessionUpdate) -> Self {
        Self::none().with_update(update)
    }

    /// Adds an update.
    #[must_use]
    pub fn with_update(mut self, update: SessionUpdate) -> Self {
        self.updates.push(update);
        self
    }

    /// Sets the outbound command.
    #[must_use]
    pub fn with_command(mut self, command: OutboundCommand) -> Self {
        self.command = Some(command);
        self
    }
}
