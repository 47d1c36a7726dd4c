//! # vlm-dialog
//!
//! Streaming dialog synchronization engine for a vision-language-model chat
//! client.
//!
//! A user selects an image, asks questions about it, and receives answers
//! streamed token by token. This crate turns the backend's asynchronous
//! events (queue depth, stream start, tokens, stream end) and the user's
//! actions (ask, abort, reset) into one consistent conversation history,
//! including races between a reset and a stream still in flight.
//! Rendering is left to whoever observes the session.
//!
//! ## Architecture
//!
//! ```text
//! UI / CLI
//!     │  actions (SessionHandle)          ▲ updates + snapshots (UpdateBus)
//!     ▼                                   │
//! Session loop (ws/) ── one task, tokio::select!
//!     │
//!     ├── DialogEngine (session/)
//!     │     ├── coordinator: ask / abort / reset
//!     │     └── dispatcher:  tasks / start / token / end
//!     │
//!     ├── DialogStore, StreamState (domain/)
//!     │
//!     └── WebSocket ⇄ backend
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod session;
pub mod ws;
