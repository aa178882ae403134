use std::sync::Arc;
use std::time::Duration;

use intake_core::realtime::ADMIN_CHANNEL;
use tokio_util::sync::CancellationToken;

use crate::ws::manager::WsManager;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Ping admin sockets periodically until `cancel` fires.
///
/// Sockets whose writer has stopped are pruned so they no longer count as
/// subscribers of the admin channel.
pub fn start_heartbeat(
    ws_manager: Arc<WsManager>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let pruned = ws_manager.ping_all().await;
            let subscribers = ws_manager.subscriber_count(ADMIN_CHANNEL).await;
            if pruned > 0 {
                tracing::info!(pruned, subscribers, "Pruned dead admin sockets");
            } else {
                tracing::debug!(subscribers, "Admin socket heartbeat");
            }
        }
    })
}
