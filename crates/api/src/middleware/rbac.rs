//! Role gates layered on top of [`AuthUser`].
//!
//! ```ignore
//! async fn list(RequireStaff(user): RequireStaff) -> AppResult<Json<()>> {
//!     Ok(Json(()))
//! }
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use intake_core::error::CoreError;
use intake_core::roles::{is_staff, ROLE_ADMIN};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticate, then check the role with `allowed`. A valid token with the
/// wrong role is a 403.
async fn authorize(
    parts: &mut Parts,
    state: &AppState,
    allowed: fn(&str) -> bool,
    denied: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !allowed(&user.role) {
        tracing::warn!(user_id = user.user_id, role = %user.role, "Role not permitted");
        return Err(AppError::Core(CoreError::Forbidden(denied.to_string())));
    }
    Ok(user)
}

/// Admin or reviewer. Guards the review console.
pub struct RequireStaff(pub AuthUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, is_staff, "Staff role required")
            .await
            .map(RequireStaff)
    }
}

/// Admin only. Guards template management.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, |role| role == ROLE_ADMIN, "Admin role required")
            .await
            .map(RequireAdmin)
    }
}
