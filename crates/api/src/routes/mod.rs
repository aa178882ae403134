pub mod auth;
pub mod email_templates;
pub mod health;
pub mod realtime;
pub mod submissions;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  WebSocket (grant-gated channels)
///
/// /auth/login                          staff login (public)
///
/// /submissions                         list (staff), create (public)
/// /submissions/{id}                    get (staff)
/// /submissions/{id}/status             update status (PATCH, staff)
/// /submissions/{id}/reviews            record review (POST, staff)
///
/// /realtime/auth                       issue channel grant (POST, staff)
///
/// /email-templates                     list (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket endpoint.
        .route("/ws", get(ws::ws_handler))
        // Staff authentication.
        .nest("/auth", auth::router())
        // Public intake and the review console.
        .nest("/submissions", submissions::router())
        // Realtime channel grants.
        .nest("/realtime", realtime::router())
        // Artist email templates.
        .nest("/email-templates", email_templates::router())
}
