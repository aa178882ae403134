//! REST client for the intake API's staff routes.
//!
//! Wraps sign-in, submission listing and detail, status changes, and
//! realtime channel grants using [`reqwest`].

use intake_core::query::SubmissionListParams;
use intake_core::submission::SubmissionStatus;
use intake_core::types::DbId;
use serde::de::DeserializeOwned;

use crate::error::SyncError;
use crate::model::{ChannelGrant, DataEnvelope, ListPage, LoginResponse, SubmissionView};

/// HTTP client for one intake API deployment.
#[derive(Clone)]
pub struct AdminApiClient {
    client: reqwest::Client,
    /// Base URL including the version prefix, e.g. `http://host:3000/api/v1`.
    api_url: String,
    token: Option<String>,
}

impl AdminApiClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling).
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Use an already issued bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Sign in with staff credentials and keep the token for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse, SyncError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response = self
            .client
            .post(format!("{}/auth/login", self.api_url))
            .json(&body)
            .send()
            .await?;

        let login: LoginResponse = Self::parse_response(response).await?;
        tracing::info!(user_id = login.user.id, role = %login.user.role, "Signed in");
        self.token = Some(login.access_token.clone());
        Ok(login)
    }

    /// `GET /submissions` with the console's current parameters.
    pub async fn list_submissions(
        &self,
        params: &SubmissionListParams,
    ) -> Result<ListPage, SyncError> {
        let response = self
            .client
            .get(format!("{}/submissions", self.api_url))
            .bearer_auth(self.token()?)
            .query(params)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// `GET /submissions/{id}`.
    pub async fn get_submission(&self, id: DbId) -> Result<SubmissionView, SyncError> {
        let response = self
            .client
            .get(format!("{}/submissions/{id}", self.api_url))
            .bearer_auth(self.token()?)
            .send()
            .await?;

        let envelope: DataEnvelope<SubmissionView> = Self::parse_response(response).await?;
        Ok(envelope.data)
    }

    /// `PATCH /submissions/{id}/status`. Returns the row as the server stored it.
    pub async fn update_status(
        &self,
        id: DbId,
        status: SubmissionStatus,
    ) -> Result<SubmissionView, SyncError> {
        let response = self
            .client
            .patch(format!("{}/submissions/{id}/status", self.api_url))
            .bearer_auth(self.token()?)
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await?;

        let envelope: DataEnvelope<SubmissionView> = Self::parse_response(response).await?;
        Ok(envelope.data)
    }

    /// `POST /realtime/auth` for a socket id received on the WebSocket.
    pub async fn realtime_auth(
        &self,
        socket_id: &str,
        channel_name: &str,
    ) -> Result<ChannelGrant, SyncError> {
        let body = serde_json::json!({ "socket_id": socket_id, "channel_name": channel_name });
        let response = self
            .client
            .post(format!("{}/realtime/auth", self.api_url))
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn token(&self) -> Result<&str, SyncError> {
        self.token.as_deref().ok_or(SyncError::NotSignedIn)
    }

    /// Turn a non-2xx response into [`SyncError::Api`] with the body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SyncError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SyncError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
