//! WebSocket infrastructure for the realtime admin channel.
//!
//! Provides connection management with per-socket channel subscriptions,
//! heartbeat monitoring, and the HTTP upgrade handler.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
