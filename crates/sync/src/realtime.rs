//! WebSocket listener for the admin realtime channel.
//!
//! [`RealtimeListener::connect`] opens the socket, waits for the server to
//! announce the socket id, obtains a signed grant over HTTP, and subscribes
//! to the admin channel. The resulting [`RealtimeConnection`] yields decoded
//! [`SubmissionEvent`]s until the socket closes.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use intake_core::realtime::{
    ConnectionEstablished, Frame, SubmissionEvent, ADMIN_CHANNEL, EVENT_CONNECTION_ESTABLISHED,
    EVENT_SUBSCRIBE, EVENT_SUBSCRIPTION_ERROR, EVENT_SUBSCRIPTION_SUCCEEDED,
};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::client::AdminApiClient;
use crate::error::SyncError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for each handshake frame.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the realtime endpoint.
#[derive(Debug, Clone)]
pub struct RealtimeListener {
    /// Full WebSocket URL, e.g. `ws://host:3000/api/v1/ws`.
    ws_url: String,
}

/// A subscribed realtime socket.
#[derive(Debug)]
pub struct RealtimeConnection {
    pub socket_id: String,
    stream: WsStream,
}

impl RealtimeListener {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Connect and subscribe to the admin channel.
    pub async fn connect(&self, api: &AdminApiClient) -> Result<RealtimeConnection, SyncError> {
        let (mut stream, _response) = connect_async(self.ws_url.as_str()).await.map_err(|e| {
            SyncError::Connection(format!("Failed to connect to {}: {e}", self.ws_url))
        })?;

        let established = read_frame(&mut stream).await?;
        if established.event != EVENT_CONNECTION_ESTABLISHED {
            return Err(SyncError::Protocol(format!(
                "expected {EVENT_CONNECTION_ESTABLISHED}, got {}",
                established.event
            )));
        }
        let ConnectionEstablished { socket_id } = serde_json::from_value(established.data)
            .map_err(|e| SyncError::Protocol(format!("bad connection frame: {e}")))?;

        let grant = api.realtime_auth(&socket_id, ADMIN_CHANNEL).await?;

        let subscribe = Frame::new(
            EVENT_SUBSCRIBE,
            serde_json::json!({
                "channel": ADMIN_CHANNEL,
                "auth": grant.auth,
                "expires_at": grant.expires_at,
            }),
        );
        let text = serde_json::to_string(&subscribe)
            .map_err(|e| SyncError::Protocol(format!("cannot encode subscribe frame: {e}")))?;
        stream
            .send(Message::Text(text))
            .await
            .map_err(|e| SyncError::Connection(e.to_string()))?;

        let reply = read_frame(&mut stream).await?;
        match reply.event.as_str() {
            EVENT_SUBSCRIPTION_SUCCEEDED => {}
            EVENT_SUBSCRIPTION_ERROR => {
                let reason = reply.data["error"].as_str().unwrap_or("unknown").to_string();
                return Err(SyncError::SubscriptionRefused(reason));
            }
            other => {
                return Err(SyncError::Protocol(format!(
                    "unexpected reply to subscribe: {other}"
                )))
            }
        }

        tracing::info!(socket_id = %socket_id, channel = ADMIN_CHANNEL, "Realtime subscribed");
        Ok(RealtimeConnection { socket_id, stream })
    }
}

impl RealtimeConnection {
    /// Next submission event on the admin channel.
    ///
    /// Returns `Ok(None)` once the server closes the socket. Frames for
    /// other channels or events are skipped.
    pub async fn next_event(&mut self) -> Result<Option<SubmissionEvent>, SyncError> {
        while let Some(message) = self.stream.next().await {
            let message = message.map_err(|e| SyncError::Connection(e.to_string()))?;
            match message {
                Message::Text(text) => {
                    if let Some(event) = decode_event(&text) {
                        return Ok(Some(event));
                    }
                }
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }
}

/// Decode a text frame into an admin-channel event.
pub fn decode_event(text: &str) -> Option<SubmissionEvent> {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed realtime frame");
            return None;
        }
    };
    if frame.channel.as_deref() != Some(ADMIN_CHANNEL) {
        return None;
    }
    SubmissionEvent::from_frame(&frame)
}

/// Read the next text frame during the handshake.
async fn read_frame(stream: &mut WsStream) -> Result<Frame, SyncError> {
    loop {
        let next = tokio::time::timeout(HANDSHAKE_TIMEOUT, stream.next())
            .await
            .map_err(|_| SyncError::Protocol("handshake timed out".into()))?;
        match next {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(&text)
                    .map_err(|e| SyncError::Protocol(format!("bad frame: {e}")));
            }
            Some(Ok(Message::Close(_))) | None => {
                return Err(SyncError::Connection("closed during handshake".into()))
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(SyncError::Connection(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Reconnect backoff
// ---------------------------------------------------------------------------

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Next backoff delay, clamped to [`ReconnectConfig::max_delay`].
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Keep trying to connect and subscribe with exponential backoff.
///
/// Returns `None` if `cancel` fires first.
pub async fn reconnect_loop(
    listener: &RealtimeListener,
    api: &AdminApiClient,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<RealtimeConnection> {
    let mut delay = config.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        tokio::select! {
            _ = cancel.cancelled() => return None,
            result = listener.connect(api) => match result {
                Ok(conn) => {
                    tracing::info!(attempt, "Realtime reconnected");
                    return Some(conn);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Realtime connect failed"
                    );
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        delay = next_delay(delay, config);
    }
}
