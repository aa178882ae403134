use std::sync::Arc;

use crate::config::ServerConfig;
use crate::media::MediaConfirmer;
use crate::notifications::SubmissionNotifier;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind `Arc` or is already a handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: intake_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (admin consoles).
    pub ws_manager: Arc<WsManager>,
    /// Post-commit event publication and artist emails.
    pub notifier: SubmissionNotifier,
    /// Upload confirmation against the media store.
    pub media: Arc<dyn MediaConfirmer>,
}
