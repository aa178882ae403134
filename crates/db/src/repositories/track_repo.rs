//! Repository for the `tracks` table.

use intake_core::submission::NewTrack;
use intake_core::types::DbId;
use sqlx::PgPool;

use crate::models::track::Track;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, submission_id, title, genre, bpm, musical_key, description, \
                        file_url, stream_url, public_id, file_type, file_size, duration, created_at";

/// Column list for INSERT (excludes auto-generated `id` and `created_at`).
const INSERT_COLUMNS: &str = "submission_id, title, genre, bpm, musical_key, description, \
                               file_url, stream_url, public_id, file_type, file_size, duration";

const INSERT_COLUMN_COUNT: u32 = 12;

/// Provides insert and batch-read operations for tracks.
pub struct TrackRepo;

impl TrackRepo {
    /// Insert every track of a submission with one multi-row INSERT.
    pub async fn insert_many(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        submission_id: DbId,
        tracks: &[NewTrack],
    ) -> Result<Vec<Track>, sqlx::Error> {
        if tracks.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = format!("INSERT INTO tracks ({INSERT_COLUMNS}) VALUES ");
        let mut param_idx = 1u32;
        for (n, _) in tracks.iter().enumerate() {
            if n > 0 {
                query.push_str(", ");
            }
            query.push('(');
            for i in 0..INSERT_COLUMN_COUNT {
                if i > 0 {
                    query.push_str(", ");
                }
                query.push_str(&format!("${param_idx}"));
                param_idx += 1;
            }
            query.push(')');
        }
        query.push_str(&format!(" RETURNING {COLUMNS}"));

        let mut q = sqlx::query_as::<_, Track>(&query);
        for track in tracks {
            q = q
                .bind(submission_id)
                .bind(&track.title)
                .bind(&track.genre)
                .bind(track.bpm)
                .bind(&track.musical_key)
                .bind(&track.description)
                .bind(&track.file_url)
                .bind(&track.stream_url)
                .bind(&track.public_id)
                .bind(&track.file_type)
                .bind(track.file_size)
                .bind(track.duration);
        }

        q.fetch_all(&mut **tx).await
    }

    /// All tracks for the given submissions, in insertion order per submission.
    pub async fn list_for_submissions(
        pool: &PgPool,
        submission_ids: &[DbId],
    ) -> Result<Vec<Track>, sqlx::Error> {
        if submission_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM tracks WHERE submission_id = ANY($1) \
             ORDER BY submission_id, id"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(submission_ids)
            .fetch_all(pool)
            .await
    }
}
