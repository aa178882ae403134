//! Notification fan-out for the demo intake portal.
//!
//! - [`EventBus`]: in-process publish/subscribe hub for
//!   [`SubmissionEvent`](intake_core::realtime::SubmissionEvent)s, backed by
//!   `tokio::sync::broadcast`.
//! - [`EventPublisher`]: the seam request handlers publish through.
//! - [`BackgroundDispatcher`]: supervised runner for detached side effects
//!   with a bounded dead-letter sink.
//! - [`delivery`]: templated SMTP email.

pub mod bus;
pub mod delivery;
pub mod dispatcher;

pub use bus::{EventBus, EventPublisher};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use dispatcher::{BackgroundDispatcher, DeadLetter, DispatcherHandle};
