//! Channel grant issuance for the realtime WebSocket.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use intake_core::error::CoreError;
use intake_core::realtime::{is_allowed_channel, sign_channel_grant};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::state::AppState;

/// Request body for `POST /realtime/auth`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChannelAuthRequest {
    pub socket_id: Option<String>,
    pub channel_name: Option<String>,
}

/// A signed, time-boxed grant for one socket on one channel.
#[derive(Debug, Serialize)]
pub struct ChannelAuthResponse {
    pub auth: String,
    /// Unix seconds after which the grant is refused.
    pub expires_at: i64,
}

/// POST /api/v1/realtime/auth
///
/// The socket id comes from the `connection_established` frame the client
/// received on `/ws`.
pub async fn authorize_channel(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    body: Result<Json<ChannelAuthRequest>, JsonRejection>,
) -> AppResult<Json<ChannelAuthResponse>> {
    let Json(input) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(socket_id), Some(channel)) =
        (non_blank(input.socket_id), non_blank(input.channel_name))
    else {
        return Err(AppError::BadRequest(
            "Missing socket_id or channel_name".into(),
        ));
    };

    if !is_allowed_channel(&channel) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Invalid channel '{channel}'"
        ))));
    }

    let realtime = &state.config.realtime;
    let expires_at = chrono::Utc::now().timestamp() + realtime.grant_ttl_secs;
    let auth = sign_channel_grant(
        &realtime.key,
        &realtime.secret,
        &socket_id,
        &channel,
        expires_at,
    );

    tracing::info!(
        user_id = user.user_id,
        socket_id = %socket_id,
        channel = %channel,
        "Channel grant issued"
    );

    Ok(Json(ChannelAuthResponse { auth, expires_at }))
}
