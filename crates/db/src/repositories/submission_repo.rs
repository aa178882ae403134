//! Repository for the `submissions` table and its joined reads.

use std::collections::HashMap;

use intake_core::query::SubmissionQuery;
use intake_core::submission::{NewSubmission, SubmissionStatus};
use intake_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::review::Review;
use crate::models::submission::{SubmissionDetail, SubmissionRow};
use crate::models::track::Track;
use crate::repositories::submission_query::{self, FROM_CLAUSE, ROW_COLUMNS};
use crate::repositories::{ArtistRepo, ReviewRepo, TrackRepo};

/// Provides the submission write path and the joined admin reads.
pub struct SubmissionRepo;

impl SubmissionRepo {
    /// Persist a validated submission atomically.
    ///
    /// Upserts the artist by email, inserts the submission as `PENDING`, and
    /// inserts every track in one transaction. Nothing is written if any
    /// step fails. The returned detail is built from the rows the
    /// transaction wrote, so a successful commit is never followed by a
    /// failing read.
    pub async fn create(
        pool: &PgPool,
        input: &NewSubmission,
    ) -> Result<SubmissionDetail, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let artist = ArtistRepo::upsert_by_email(&mut tx, &input.artist).await?;

        let (submission_id, submitted_at, updated_at) =
            sqlx::query_as::<_, (DbId, Timestamp, Timestamp)>(
                "INSERT INTO submissions (artist_id, status) VALUES ($1, $2) \
                 RETURNING id, submitted_at, updated_at",
            )
            .bind(artist.id)
            .bind(SubmissionStatus::Pending.as_str())
            .fetch_one(&mut *tx)
            .await?;

        let tracks = TrackRepo::insert_many(&mut tx, submission_id, &input.tracks).await?;

        tx.commit().await?;

        tracing::debug!(submission_id, artist_id = artist.id, "Submission persisted");

        Ok(SubmissionDetail {
            id: submission_id,
            status: SubmissionStatus::Pending,
            submitted_at,
            updated_at,
            artist,
            tracks,
            reviews: Vec::new(),
        })
    }

    /// Run a filtered, sorted, paginated list query.
    ///
    /// Returns the page and the total number of rows matching the filter.
    /// The count and the page run concurrently against the same predicate.
    pub async fn list(
        pool: &PgPool,
        query: &SubmissionQuery,
    ) -> Result<(Vec<SubmissionDetail>, i64), sqlx::Error> {
        let (rows, total) = tokio::try_join!(
            submission_query::fetch_page(
                pool,
                &query.filter,
                &query.sort,
                query.page.page_size(),
                query.page.offset(),
            ),
            submission_query::count(pool, &query.filter),
        )?;

        let details = Self::hydrate(pool, rows).await?;
        Ok((details, total))
    }

    /// Find one submission with its artist, tracks, and reviews.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SubmissionDetail>, sqlx::Error> {
        let query = format!("SELECT {ROW_COLUMNS} {FROM_CLAUSE} WHERE s.id = $1");
        let row = sqlx::query_as::<_, SubmissionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match row {
            Some(row) => Ok(Self::hydrate(pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Set the status of a submission. Any status may replace any other.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: SubmissionStatus,
    ) -> Result<Option<SubmissionDetail>, sqlx::Error> {
        let updated = sqlx::query_scalar::<_, DbId>(
            "UPDATE submissions SET status = $2 WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(id) => Self::find_by_id(pool, id).await,
            None => Ok(None),
        }
    }

    /// Attach tracks and reviews to joined rows, preserving row order.
    async fn hydrate(
        pool: &PgPool,
        rows: Vec<SubmissionRow>,
    ) -> Result<Vec<SubmissionDetail>, sqlx::Error> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
        let (tracks, reviews) = tokio::try_join!(
            TrackRepo::list_for_submissions(pool, &ids),
            ReviewRepo::list_for_submissions(pool, &ids),
        )?;

        let mut tracks_by_submission: HashMap<DbId, Vec<Track>> = HashMap::new();
        for track in tracks {
            tracks_by_submission
                .entry(track.submission_id)
                .or_default()
                .push(track);
        }
        let mut reviews_by_submission: HashMap<DbId, Vec<Review>> = HashMap::new();
        for review in reviews {
            reviews_by_submission
                .entry(review.submission_id)
                .or_default()
                .push(review);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tracks = tracks_by_submission.remove(&row.id).unwrap_or_default();
                let reviews = reviews_by_submission.remove(&row.id).unwrap_or_default();
                SubmissionDetail::assemble(row, tracks, reviews)
            })
            .collect())
    }
}
