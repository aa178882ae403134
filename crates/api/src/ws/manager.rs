use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// Channels this socket has presented a valid grant for.
    pub channels: HashSet<String>,
}

/// Manages all active WebSocket connections, keyed by socket id.
///
/// Thread-safe via interior `RwLock`; wrapped in `Arc` and shared across the
/// application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection with no subscriptions.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, socket_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            sender: tx,
            channels: HashSet::new(),
        };
        self.connections.write().await.insert(socket_id, conn);
        rx
    }

    /// Remove a connection by its socket id.
    pub async fn remove(&self, socket_id: &str) {
        self.connections.write().await.remove(socket_id);
    }

    /// Subscribe a connection to `channel`. Returns `false` if the socket is gone.
    ///
    /// Callers must have verified the socket's grant first.
    pub async fn subscribe(&self, socket_id: &str, channel: &str) -> bool {
        match self.connections.write().await.get_mut(socket_id) {
            Some(conn) => {
                conn.channels.insert(channel.to_string());
                true
            }
            None => false,
        }
    }

    /// Send a message to one connection. Returns `false` if the socket is gone.
    pub async fn send_to(&self, socket_id: &str, message: Message) -> bool {
        match self.connections.read().await.get(socket_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Send a message to every connection subscribed to `channel`.
    ///
    /// Connections whose send channels are closed are skipped (they are
    /// cleaned up when their receive loop ends). Returns the number of
    /// connections the message was handed to.
    pub async fn broadcast_to_channel(&self, channel: &str, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values().filter(|c| c.channels.contains(channel)) {
            if conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Number of connections subscribed to `channel`.
    pub async fn subscriber_count(&self, channel: &str) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|c| c.channels.contains(channel))
            .count()
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Ping every client and drop the ones whose writer task has gone away.
    ///
    /// Returns how many connections were pruned.
    pub async fn ping_all(&self) -> usize {
        let mut conns = self.connections.write().await;
        let before = conns.len();
        conns.retain(|_, conn| conn.sender.send(Message::Ping(Bytes::new())).is_ok());
        before - conns.len()
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
