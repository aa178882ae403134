//! Response shapes the admin console reads.
//!
//! Only the fields the console renders are declared; anything else the
//! server sends is ignored.

use intake_core::query::{AppliedFilters, PaginationMeta, Sort};
use intake_core::submission::SubmissionStatus;
use intake_core::types::{DbId, Timestamp};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistView {
    pub id: DbId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub soundcloud: Option<String>,
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackView {
    pub id: DbId,
    pub title: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub bpm: Option<i32>,
    pub file_url: String,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewerView {
    pub id: DbId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: DbId,
    #[serde(default)]
    pub grade: Option<i32>,
    pub feedback: String,
    pub reviewed_at: Timestamp,
    pub reviewer: ReviewerView,
}

/// One submission as the console shows it, in the list or the detail pane.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub id: DbId,
    pub status: SubmissionStatus,
    pub submitted_at: Timestamp,
    pub updated_at: Timestamp,
    pub artist: ArtistView,
    #[serde(default)]
    pub tracks: Vec<TrackView>,
    #[serde(default)]
    pub reviews: Vec<ReviewView>,
}

/// `GET /submissions` body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListPage {
    pub data: Vec<SubmissionView>,
    pub pagination: PaginationMeta,
    pub filters: AppliedFilters,
    pub sorting: Sort,
}

impl ListPage {
    /// The row for `id` if it is on this page.
    pub fn find(&self, id: DbId) -> Option<&SubmissionView> {
        self.data.iter().find(|s| s.id == id)
    }
}

/// Envelope used by single-item responses.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

/// `POST /auth/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub user: StaffUser,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StaffUser {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// `POST /realtime/auth` body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelGrant {
    pub auth: String,
    pub expires_at: i64,
}
