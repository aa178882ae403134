/// Row id of artists, submissions, tracks, reviews and staff users (`BIGSERIAL`).
pub type DbId = i64;

/// `TIMESTAMPTZ` columns, always read and written as UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
