//! Realtime channel names, wire frames, domain event payloads, and
//! per-socket channel grants.
//!
//! Frames on the admin WebSocket are JSON objects shaped
//! `{ "event": ..., "channel": ..., "data": ... }`. A client must present a
//! server-signed, time-boxed grant before it receives any channel events.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::submission::SubmissionStatus;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Channel and event names
// ---------------------------------------------------------------------------

/// The single channel carrying all admin-facing submission events.
pub const ADMIN_CHANNEL: &str = "private-submissions";

/// Channels a client may request a grant for.
pub const ALLOWED_CHANNELS: &[&str] = &[ADMIN_CHANNEL];

/// Check whether a channel name is on the allow-list.
pub fn is_allowed_channel(name: &str) -> bool {
    ALLOWED_CHANNELS.contains(&name)
}

pub const EVENT_NEW_SUBMISSION: &str = "new-submission";
pub const EVENT_SUBMISSION_UPDATED: &str = "submission-updated";

/// Sent by the server right after the socket opens; carries the socket id.
pub const EVENT_CONNECTION_ESTABLISHED: &str = "connection_established";
/// Sent by the client to join a channel with a grant.
pub const EVENT_SUBSCRIBE: &str = "subscribe";
pub const EVENT_SUBSCRIPTION_SUCCEEDED: &str = "subscription_succeeded";
pub const EVENT_SUBSCRIPTION_ERROR: &str = "subscription_error";

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// A JSON frame on the realtime socket (both directions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            channel: None,
            data,
        }
    }

    pub fn on_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}

/// Payload of [`EVENT_CONNECTION_ESTABLISHED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEstablished {
    pub socket_id: String,
}

/// Payload of a client [`EVENT_SUBSCRIBE`] frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub channel: String,
    pub auth: String,
    pub expires_at: i64,
}

// ---------------------------------------------------------------------------
// Domain events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmissionPayload {
    pub submission_id: DbId,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionUpdatedPayload {
    pub submission_id: DbId,
    pub status: SubmissionStatus,
    pub timestamp: Timestamp,
}

/// A domain event fanned out to every subscribed admin session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    NewSubmission(NewSubmissionPayload),
    SubmissionUpdated(SubmissionUpdatedPayload),
}

impl SubmissionEvent {
    pub fn new_submission(submission_id: DbId) -> Self {
        SubmissionEvent::NewSubmission(NewSubmissionPayload {
            submission_id,
            timestamp: chrono::Utc::now(),
        })
    }

    pub fn submission_updated(submission_id: DbId, status: SubmissionStatus) -> Self {
        SubmissionEvent::SubmissionUpdated(SubmissionUpdatedPayload {
            submission_id,
            status,
            timestamp: chrono::Utc::now(),
        })
    }

    /// Wire event name.
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionEvent::NewSubmission(_) => EVENT_NEW_SUBMISSION,
            SubmissionEvent::SubmissionUpdated(_) => EVENT_SUBMISSION_UPDATED,
        }
    }

    pub fn submission_id(&self) -> DbId {
        match self {
            SubmissionEvent::NewSubmission(p) => p.submission_id,
            SubmissionEvent::SubmissionUpdated(p) => p.submission_id,
        }
    }

    /// Encode as a frame on `channel`.
    pub fn to_frame(&self, channel: &str) -> Frame {
        let data = match self {
            SubmissionEvent::NewSubmission(p) => serde_json::to_value(p),
            SubmissionEvent::SubmissionUpdated(p) => serde_json::to_value(p),
        }
        .unwrap_or_default();
        Frame::new(self.name(), data).on_channel(channel)
    }

    /// Decode a frame; `None` for frames that are not submission events.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        match frame.event.as_str() {
            EVENT_NEW_SUBMISSION => serde_json::from_value(frame.data.clone())
                .ok()
                .map(SubmissionEvent::NewSubmission),
            EVENT_SUBMISSION_UPDATED => serde_json::from_value(frame.data.clone())
                .ok()
                .map(SubmissionEvent::SubmissionUpdated),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Channel grants
// ---------------------------------------------------------------------------

type HmacSha256 = Hmac<Sha256>;

/// Why a channel grant was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrantError {
    #[error("Channel '{0}' is not available")]
    UnknownChannel(String),
    #[error("Channel grant has expired")]
    Expired,
    #[error("Channel grant signature is invalid")]
    BadSignature,
}

/// Sign a grant for `socket_id` to join `channel` until `expires_at`
/// (Unix seconds).
///
/// Returns `"<key>:<hex hmac-sha256>"` over `socket_id:channel:expires_at`.
pub fn sign_channel_grant(
    key: &str,
    secret: &str,
    socket_id: &str,
    channel: &str,
    expires_at: i64,
) -> String {
    let signature = grant_mac(secret, socket_id, channel, expires_at)
        .finalize()
        .into_bytes();
    let hex: String = signature.iter().map(|b| format!("{b:02x}")).collect();
    format!("{key}:{hex}")
}

fn grant_mac(secret: &str, socket_id: &str, channel: &str, expires_at: i64) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{socket_id}:{channel}:{expires_at}").as_bytes());
    mac
}

/// Decode lowercase or uppercase hex. `None` on odd length or a non-hex digit.
fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            Some((hi * 16 + lo) as u8)
        })
        .collect()
}

/// Verify a grant presented by `socket_id` at time `now` (Unix seconds).
///
/// The signature is checked in constant time.
pub fn verify_channel_grant(
    key: &str,
    secret: &str,
    socket_id: &str,
    request: &SubscribeRequest,
    now: i64,
) -> Result<(), GrantError> {
    if !is_allowed_channel(&request.channel) {
        return Err(GrantError::UnknownChannel(request.channel.clone()));
    }
    if request.expires_at <= now {
        return Err(GrantError::Expired);
    }

    let signature = request
        .auth
        .split_once(':')
        .filter(|(presented_key, _)| *presented_key == key)
        .and_then(|(_, hex)| decode_hex(hex))
        .ok_or(GrantError::BadSignature)?;

    grant_mac(secret, socket_id, &request.channel, request.expires_at)
        .verify_slice(&signature)
        .map_err(|_| GrantError::BadSignature)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
