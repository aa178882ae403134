//! Artist entity model.

use intake_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// An artist row from the `artists` table. `email` is the natural key.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub instagram: Option<String>,
    pub soundcloud: Option<String>,
    pub spotify: Option<String>,
    pub bio: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
