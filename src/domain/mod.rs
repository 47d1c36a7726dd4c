//! Domain layer: dialog model, stream state, protocol, and observer bus.
//!
//! This module contains the client-side model of one conversation: the
//! ordered dialog of question/answer turns, the state of the answer stream,
//! the transport-independent protocol vocabulary, and the channels used to
//! notify observers of changes.

pub mod dialog;
pub mod protocol;
pub mod qna;
pub mod session_id;
pub mod session_update;
pub mod snapshot;
pub mod stream_state;
pub mod update_bus;

pub use dialog::DialogStore;
pub use protocol::{InboundEvent, OutboundCommand};
pub use qna::{Answer, ImageRef, QnA};
pub use session_id::SessionId;
pub use session_update::SessionUpdate;
pub use snapshot::SessionSnapshot;
pub use stream_state::StreamState;
pub use update_bus::UpdateBus;
