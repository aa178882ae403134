//! Route definitions for the `/submissions` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::submissions;
use crate::state::AppState;

/// Routes mounted at `/submissions`.
///
/// ```text
/// GET    /               -> list (staff)
/// POST   /               -> create (public)
/// GET    /{id}           -> get_by_id (staff)
/// PATCH  /{id}/status    -> update_status (staff)
/// POST   /{id}/reviews   -> create_review (staff)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(submissions::list).post(submissions::create))
        .route("/{id}", get(submissions::get_by_id))
        .route("/{id}/status", patch(submissions::update_status))
        .route("/{id}/reviews", post(submissions::create_review))
}
