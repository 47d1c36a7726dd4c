//! Session layer: the dialog synchronization core.
//!
//! The [`dispatcher`] applies backend events, the [`coordinator`] validates
//! user actions, and the [`DialogEngine`] owns the state both of them
//! mutate. None of this code performs I/O.

pub mod coordinator;
pub mod dispatcher;
pub mod engine;
pub mod state;
pub mod transition;

pub use coordinator::UserAction;
pub use engine::DialogEngine;
pub use state::SessionState;
pub use transition::Transition;
