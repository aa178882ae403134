//! Repository for the `reviews` table.

use intake_core::types::DbId;
use sqlx::PgPool;

use crate::models::review::{CreateReview, Review, ReviewRow};

/// Review columns joined with the reviewer's public identity.
const JOINED_COLUMNS: &str = "r.id, r.submission_id, r.reviewer_id, \
                               u.name AS reviewer_name, u.email AS reviewer_email, \
                               r.grade, r.feedback, r.internal_notes, r.reviewed_at";

/// Provides insert and read operations for reviews.
pub struct ReviewRepo;

impl ReviewRepo {
    /// Record a review, returning it with the reviewer attached.
    pub async fn create(pool: &PgPool, input: &CreateReview) -> Result<Review, sqlx::Error> {
        let query = format!(
            "WITH r AS ( \
                INSERT INTO reviews (submission_id, reviewer_id, grade, feedback, internal_notes) \
                VALUES ($1, $2, $3, $4, $5) \
                RETURNING * \
             ) \
             SELECT {JOINED_COLUMNS} FROM r JOIN users u ON u.id = r.reviewer_id"
        );
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(input.submission_id)
            .bind(input.reviewer_id)
            .bind(input.grade)
            .bind(&input.feedback)
            .bind(&input.internal_notes)
            .fetch_one(pool)
            .await
            .map(Review::from)
    }

    /// All reviews for the given submissions, newest first per submission.
    pub async fn list_for_submissions(
        pool: &PgPool,
        submission_ids: &[DbId],
    ) -> Result<Vec<Review>, sqlx::Error> {
        if submission_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM reviews r JOIN users u ON u.id = r.reviewer_id \
             WHERE r.submission_id = ANY($1) \
             ORDER BY r.submission_id, r.reviewed_at DESC, r.id DESC"
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&query)
            .bind(submission_ids)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// The most recent review of a submission, if any.
    pub async fn latest_for_submission(
        pool: &PgPool,
        submission_id: DbId,
    ) -> Result<Option<Review>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM reviews r JOIN users u ON u.id = r.reviewer_id \
             WHERE r.submission_id = $1 \
             ORDER BY r.reviewed_at DESC, r.id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(submission_id)
            .fetch_optional(pool)
            .await
            .map(|row| row.map(Review::from))
    }
}
