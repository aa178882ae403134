//! Submission status and the normalized write-side submission types.
//!
//! [`NewSubmission`] is only ever produced by
//! [`validate_submission`](crate::validation::validate_submission), so holding
//! one means every field rule has already been checked.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Review status of a submission.
///
/// Any status may move to any other; there is no transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [SubmissionStatus; 4] = [
        SubmissionStatus::Pending,
        SubmissionStatus::InReview,
        SubmissionStatus::Approved,
        SubmissionStatus::Rejected,
    ];

    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::InReview => "IN_REVIEW",
            SubmissionStatus::Approved => "APPROVED",
            SubmissionStatus::Rejected => "REJECTED",
        }
    }

    /// Whether the status ends the review (an artist email is sent).
    pub fn is_decision(&self) -> bool {
        matches!(self, SubmissionStatus::Approved | SubmissionStatus::Rejected)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a [`SubmissionStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown submission status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for SubmissionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubmissionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for SubmissionStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Normalized write-side types
// ---------------------------------------------------------------------------

/// Artist fields, trimmed, with empty optionals collapsed to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArtist {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub instagram: Option<String>,
    pub soundcloud: Option<String>,
    pub spotify: Option<String>,
    pub bio: Option<String>,
}

/// One uploaded track with its artist-supplied metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrack {
    pub title: String,
    pub genre: Option<String>,
    pub bpm: Option<i32>,
    pub musical_key: Option<String>,
    pub description: Option<String>,
    pub file_url: String,
    pub stream_url: Option<String>,
    /// External storage identifier issued by the upload provider.
    pub public_id: String,
    /// MIME type, always `audio/<format>`.
    pub file_type: String,
    pub file_size: i64,
    pub duration: Option<f64>,
}

/// A validated submission ready for persistence. Always has at least one track.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub artist: NewArtist,
    pub tracks: Vec<NewTrack>,
}

impl NewSubmission {
    /// Storage identifiers of every track, in submission order.
    pub fn public_ids(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.public_id.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
