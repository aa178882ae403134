/// Errors from the admin sync client.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Calls that need a bearer token were made before signing in.
    #[error("Not signed in")]
    NotSignedIn,

    /// Failed to establish the realtime WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The realtime server sent something the handshake did not expect.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server refused the channel subscription.
    #[error("Subscription refused: {0}")]
    SubscriptionRefused(String),
}
