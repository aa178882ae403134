//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for
//! [`SubmissionEvent`]s. It is created once in `main` and shared via
//! `Arc` as an [`EventPublisher`].

use async_trait::async_trait;
use intake_core::realtime::SubmissionEvent;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// EventPublisher
// ---------------------------------------------------------------------------

/// Something that fans a [`SubmissionEvent`] out to connected admin sessions.
///
/// Errors are reported to the dispatcher's dead-letter sink, never to the
/// request that triggered the event.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: SubmissionEvent) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`SubmissionEvent`].
pub struct EventBus {
    sender: broadcast::Sender<SubmissionEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send an event to all current subscribers.
    ///
    /// Returns the number of subscribers that will see it. With no
    /// subscribers the event is dropped.
    pub fn send(&self, event: SubmissionEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: SubmissionEvent) -> anyhow::Result<()> {
        let name = event.name();
        let submission_id = event.submission_id();
        let receivers = self.send(event);
        tracing::debug!(event = name, submission_id, receivers, "Event published");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
