//! Repository for the `artists` table.

use intake_core::submission::NewArtist;
use sqlx::PgPool;

use crate::models::artist::Artist;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, phone, instagram, soundcloud, spotify, bio, \
                        created_at, updated_at";

/// Provides the upsert-by-email path that is the only way artists are written.
pub struct ArtistRepo;

impl ArtistRepo {
    /// Insert the artist, or update the existing row with the same email.
    ///
    /// The name is always replaced; optional profile fields are only
    /// replaced when the new value is present.
    pub async fn upsert_by_email(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &NewArtist,
    ) -> Result<Artist, sqlx::Error> {
        let query = format!(
            "INSERT INTO artists (name, email, phone, instagram, soundcloud, spotify, bio) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (email) DO UPDATE SET \
                name = EXCLUDED.name, \
                phone = COALESCE(EXCLUDED.phone, artists.phone), \
                instagram = COALESCE(EXCLUDED.instagram, artists.instagram), \
                soundcloud = COALESCE(EXCLUDED.soundcloud, artists.soundcloud), \
                spotify = COALESCE(EXCLUDED.spotify, artists.spotify), \
                bio = COALESCE(EXCLUDED.bio, artists.bio) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Artist>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.instagram)
            .bind(&input.soundcloud)
            .bind(&input.spotify)
            .bind(&input.bio)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find an artist by email (exact match).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Artist>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM artists WHERE email = $1");
        sqlx::query_as::<_, Artist>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }
}
