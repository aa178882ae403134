use axum::routing::get;
use axum::Router;

use crate::handlers::email_templates;
use crate::state::AppState;

/// Routes mounted at `/email-templates`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(email_templates::list))
}
