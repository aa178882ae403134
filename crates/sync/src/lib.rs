//! Admin console synchronization client.
//!
//! Keeps one staff member's submission list consistent with the server
//! while other sessions and the public form write to it.
//!
//! - [`state`]: the pure per-session state machine ([`AdminView`]).
//! - [`client`]: typed HTTP client for the `/api/v1` routes.
//! - [`realtime`]: WebSocket listener with the channel grant handshake and
//!   reconnect backoff.
//! - [`session`]: the tokio task that drives the state machine.

pub mod client;
pub mod error;
pub mod model;
pub mod realtime;
pub mod session;
pub mod state;

pub use client::AdminApiClient;
pub use error::SyncError;
pub use realtime::RealtimeListener;
pub use session::{AdminSession, SessionHandle};
pub use state::{AdminView, Command, Input, SyncState};
