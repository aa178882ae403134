//! Email template model.

use intake_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `email_templates` table. The HTML body contains
/// `{{variable}}` placeholders.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    pub id: DbId,
    pub name: String,
    pub subject: String,
    pub html_content: String,
    /// JSON array of the placeholder names the template expects.
    pub variables: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
