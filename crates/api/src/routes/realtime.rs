//! Route definitions for `/realtime`.

use axum::routing::post;
use axum::Router;

use crate::handlers::realtime;
use crate::state::AppState;

/// ```text
/// POST /auth    -> authorize_channel (staff)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/auth", post(realtime::authorize_channel))
}
