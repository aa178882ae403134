//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or an open transaction) as the first argument.

pub mod artist_repo;
pub mod email_template_repo;
pub mod review_repo;
pub mod submission_query;
pub mod submission_repo;
pub mod track_repo;
pub mod user_repo;

pub use artist_repo::ArtistRepo;
pub use email_template_repo::EmailTemplateRepo;
pub use review_repo::ReviewRepo;
pub use submission_repo::SubmissionRepo;
pub use track_repo::TrackRepo;
pub use user_repo::UserRepo;
