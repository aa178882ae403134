//! Bus-to-WebSocket relay for the admin channel.

use std::sync::Arc;

use axum::extract::ws::Message;
use intake_core::realtime::{SubmissionEvent, ADMIN_CHANNEL};
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Forwards every [`SubmissionEvent`] to sockets subscribed to
/// [`ADMIN_CHANNEL`].
pub struct RealtimeRelay {
    ws_manager: Arc<WsManager>,
}

impl RealtimeRelay {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the relay loop.
    ///
    /// Exits when the bus is dropped. A lagged receiver skips the missed
    /// events; admin clients recover on their next refresh.
    pub async fn run(self, mut receiver: broadcast::Receiver<SubmissionEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.relay(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Realtime relay lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, realtime relay shutting down");
                    break;
                }
            }
        }
    }

    async fn relay(&self, event: &SubmissionEvent) {
        let frame = event.to_frame(ADMIN_CHANNEL);
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, event = event.name(), "Failed to encode event frame");
                return;
            }
        };
        let delivered = self
            .ws_manager
            .broadcast_to_channel(ADMIN_CHANNEL, Message::Text(text.into()))
            .await;
        tracing::debug!(
            event = event.name(),
            submission_id = event.submission_id(),
            delivered,
            "Event relayed"
        );
    }
}
