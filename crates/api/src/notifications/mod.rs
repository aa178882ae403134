//! Notification fan-out wiring.
//!
//! - [`SubmissionNotifier`] decides *what* to publish and email after a
//!   committed write and hands each side effect to the background dispatcher.
//! - [`RealtimeRelay`] subscribes to the event bus and forwards events to
//!   WebSocket clients subscribed to the admin channel.

pub mod notifier;
pub mod relay;

pub use notifier::SubmissionNotifier;
pub use relay::RealtimeRelay;
