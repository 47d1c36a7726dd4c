//! WebSocket layer: endpoint addressing, wire envelope, connection loop.
//!
//! The backend is reached over one persistent WebSocket per session.
//! Frames carry JSON envelopes naming an event and its arguments.

pub mod connection;
pub mod endpoint;
pub mod messages;

pub use connection::{Session, SessionHandle};
pub use endpoint::Endpoint;
