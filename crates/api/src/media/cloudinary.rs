//! Cloudinary admin API client for tag removal.

use async_trait::async_trait;
use futures::future::try_join_all;
use sha2::{Digest, Sha256};

use super::{MediaConfig, MediaConfirmer, MediaError, AUDIO_RESOURCE_TYPE, TEMP_TAG};

/// Removes the `temp` tag from uploads through the signed tags endpoint.
pub struct CloudinaryConfirmer {
    client: reqwest::Client,
    config: MediaConfig,
}

impl CloudinaryConfirmer {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Remove the temp tag from a single upload.
    async fn remove_temp_tag(&self, public_id: &str, timestamp: i64) -> Result<(), MediaError> {
        let timestamp = timestamp.to_string();
        let mut params: Vec<(&str, String)> = vec![
            ("command", "remove".to_string()),
            ("public_ids", public_id.to_string()),
            ("tag", TEMP_TAG.to_string()),
            ("timestamp", timestamp),
        ];
        let signature = sign_params(&params, &self.config.api_secret);
        params.push(("api_key", self.config.api_key.clone()));
        params.push(("signature_algorithm", "sha256".to_string()));
        params.push(("signature", signature));

        let url = format!(
            "{}/v1_1/{}/{}/tags",
            self.config.api_base, self.config.cloud_name, AUDIO_RESOURCE_TYPE
        );
        let response = self.client.post(url).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(MediaError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MediaConfirmer for CloudinaryConfirmer {
    async fn confirm(&self, public_ids: &[String]) -> Result<(), MediaError> {
        let timestamp = chrono::Utc::now().timestamp();
        try_join_all(
            public_ids
                .iter()
                .map(|id| self.remove_temp_tag(id, timestamp)),
        )
        .await?;
        tracing::info!(count = public_ids.len(), "Uploads confirmed");
        Ok(())
    }
}

/// Sign request parameters: sort by name, join as `k=v&k=v`, append the
/// secret, SHA-256, lowercase hex.
fn sign_params(params: &[(&str, String)], secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}
