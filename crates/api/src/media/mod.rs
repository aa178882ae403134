//! Upload confirmation against the external media store.
//!
//! Tracks are uploaded directly from the browser and tagged `temp`, which
//! makes the provider garbage-collect them. Accepting a submission first
//! removes that tag so the files survive. If confirmation fails the
//! submission is refused before anything is written to the database.

mod cloudinary;

use async_trait::async_trait;

pub use cloudinary::CloudinaryConfirmer;

/// Tag placed on every fresh upload by the upload preset.
pub const TEMP_TAG: &str = "temp";

/// Provider resource type for audio files.
pub const AUDIO_RESOURCE_TYPE: &str = "video";

/// Errors from the media confirmation layer.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("Media API error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Marks uploaded files as belonging to an accepted submission.
#[async_trait]
pub trait MediaConfirmer: Send + Sync {
    /// Confirm every storage identifier. Fails if any single one fails.
    async fn confirm(&self, public_ids: &[String]) -> Result<(), MediaError>;
}

/// Confirmer used when no provider credentials are configured.
pub struct NoopConfirmer;

#[async_trait]
impl MediaConfirmer for NoopConfirmer {
    async fn confirm(&self, public_ids: &[String]) -> Result<(), MediaError> {
        tracing::debug!(
            count = public_ids.len(),
            "Media provider not configured, skipping confirmation"
        );
        Ok(())
    }
}

/// Credentials for the media provider's admin API.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// API origin, overridable for tests (default: `https://api.cloudinary.com`).
    pub api_base: String,
}

impl MediaConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless all three credentials are set.
    ///
    /// | Env Var                 | Required | Default                      |
    /// |-------------------------|----------|------------------------------|
    /// | `CLOUDINARY_CLOUD_NAME` | yes      | --                           |
    /// | `CLOUDINARY_API_KEY`    | yes      | --                           |
    /// | `CLOUDINARY_API_SECRET` | yes      | --                           |
    /// | `CLOUDINARY_API_BASE`   | no       | `https://api.cloudinary.com` |
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(Self {
            cloud_name: var("CLOUDINARY_CLOUD_NAME")?,
            api_key: var("CLOUDINARY_API_KEY")?,
            api_secret: var("CLOUDINARY_API_SECRET")?,
            api_base: var("CLOUDINARY_API_BASE")
                .unwrap_or_else(|| "https://api.cloudinary.com".to_string()),
        })
    }
}
