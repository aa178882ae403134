//! Submission read models.
//!
//! Reads return a [`SubmissionDetail`]: the submission with its artist, all
//! tracks, and all reviews (each with the reviewer's public identity).

use intake_core::submission::SubmissionStatus;
use intake_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::artist::Artist;
use crate::models::review::Review;
use crate::models::track::Track;

/// A `submissions` row joined with its artist's columns (prefixed `artist_`).
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub id: DbId,
    pub artist_id: DbId,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub submitted_at: Timestamp,
    pub updated_at: Timestamp,
    pub artist_name: String,
    pub artist_email: String,
    pub artist_phone: Option<String>,
    pub artist_instagram: Option<String>,
    pub artist_soundcloud: Option<String>,
    pub artist_spotify: Option<String>,
    pub artist_bio: Option<String>,
    pub artist_created_at: Timestamp,
    pub artist_updated_at: Timestamp,
}

/// A submission with everything an admin needs to review it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDetail {
    pub id: DbId,
    pub status: SubmissionStatus,
    pub submitted_at: Timestamp,
    pub updated_at: Timestamp,
    pub artist: Artist,
    pub tracks: Vec<Track>,
    pub reviews: Vec<Review>,
}

impl SubmissionDetail {
    /// Assemble a detail from its joined row and the related children.
    pub fn assemble(row: SubmissionRow, tracks: Vec<Track>, reviews: Vec<Review>) -> Self {
        Self {
            id: row.id,
            status: row.status,
            submitted_at: row.submitted_at,
            updated_at: row.updated_at,
            artist: Artist {
                id: row.artist_id,
                name: row.artist_name,
                email: row.artist_email,
                phone: row.artist_phone,
                instagram: row.artist_instagram,
                soundcloud: row.artist_soundcloud,
                spotify: row.artist_spotify,
                bio: row.artist_bio,
                created_at: row.artist_created_at,
                updated_at: row.artist_updated_at,
            },
            tracks,
            reviews,
        }
    }
}
