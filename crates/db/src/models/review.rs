//! Review entity model and DTOs.

use intake_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A review row joined with its reviewer's public identity.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ReviewRow {
    pub id: DbId,
    pub submission_id: DbId,
    pub reviewer_id: DbId,
    pub reviewer_name: String,
    pub reviewer_email: String,
    pub grade: Option<i32>,
    pub feedback: String,
    pub internal_notes: Option<String>,
    pub reviewed_at: Timestamp,
}

/// The staff member who wrote a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reviewer {
    pub id: DbId,
    pub name: String,
    pub email: String,
}

/// A review as returned in submission reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: DbId,
    pub submission_id: DbId,
    pub grade: Option<i32>,
    /// Shown to the artist.
    pub feedback: String,
    /// Staff only.
    pub internal_notes: Option<String>,
    pub reviewed_at: Timestamp,
    pub reviewer: Reviewer,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            submission_id: row.submission_id,
            grade: row.grade,
            feedback: row.feedback,
            internal_notes: row.internal_notes,
            reviewed_at: row.reviewed_at,
            reviewer: Reviewer {
                id: row.reviewer_id,
                name: row.reviewer_name,
                email: row.reviewer_email,
            },
        }
    }
}

/// DTO for recording a review.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReview {
    pub submission_id: DbId,
    pub reviewer_id: DbId,
    pub grade: Option<i32>,
    pub feedback: String,
    pub internal_notes: Option<String>,
}
