//! Read-only listing of the artist email templates.

use axum::extract::State;
use axum::Json;
use intake_db::models::email_template::EmailTemplate;
use intake_db::repositories::EmailTemplateRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/email-templates (admin only)
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<EmailTemplate>>>> {
    let templates = EmailTemplateRepo::list(&state.pool).await?;
    Ok(Json(DataResponse::new(templates)))
}
