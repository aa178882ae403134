//! Track entity model. Tracks are immutable once written.

use intake_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A track row from the `tracks` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: DbId,
    pub submission_id: DbId,
    pub title: String,
    pub genre: Option<String>,
    pub bpm: Option<i32>,
    pub musical_key: Option<String>,
    pub description: Option<String>,
    pub file_url: String,
    pub stream_url: Option<String>,
    pub public_id: String,
    pub file_type: String,
    pub file_size: i64,
    pub duration: Option<f64>,
    pub created_at: Timestamp,
}
