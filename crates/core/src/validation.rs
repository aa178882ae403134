//! Validation gateway for incoming submission payloads.
//!
//! [`validate_submission`] trims and normalizes the raw payload, runs every
//! field rule, and either returns a [`NewSubmission`] or a
//! [`SubmissionValidationError`] listing *all* violations with dotted paths
//! (`tracks[1].publicId`). It performs no I/O.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::submission::{NewArtist, NewSubmission, NewTrack};

/// Maximum artist bio length in characters.
pub const MAX_BIO_LEN: u64 = 1_000;

/// Maximum track description length in characters.
pub const MAX_DESCRIPTION_LEN: u64 = 500;

/// Inclusive BPM bounds.
pub const MIN_BPM: i32 = 1;
pub const MAX_BPM: i32 = 300;

/// Most tracks one submission may carry.
pub const MAX_TRACKS: usize = 20;

// ---------------------------------------------------------------------------
// Raw payload
// ---------------------------------------------------------------------------

/// Submission body as posted by the public form.
///
/// Every field defaults so that a missing value is reported as a field
/// violation instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmissionPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(url(message = "Invalid URL"))]
    pub instagram: Option<String>,
    #[validate(url(message = "Invalid URL"))]
    pub soundcloud: Option<String>,
    #[validate(url(message = "Invalid URL"))]
    pub spotify: Option<String>,
    #[validate(length(max = 1000, message = "Bio must be less than 1000 characters"))]
    pub bio: Option<String>,
    #[validate(
        length(min = 1, message = "Please upload at least one track"),
        custom(function = "at_most_max_tracks", message = "Please upload at most 20 tracks"),
        nested
    )]
    pub tracks: Vec<TrackPayload>,
}

/// One track descriptor: upload-provider metadata plus artist metadata.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackPayload {
    #[validate(length(min = 1, message = "Track public ID is required"))]
    pub public_id: String,
    #[validate(
        url(message = "Invalid track URL"),
        custom(function = "require_https", message = "Track URL must use https")
    )]
    pub secure_url: String,
    #[validate(url(message = "Invalid stream URL"))]
    pub stream_url: Option<String>,
    #[validate(length(min = 1, message = "Track format is required"))]
    pub format: String,
    #[validate(range(min = 1, message = "Invalid file size"))]
    pub bytes: i64,
    #[validate(range(exclusive_min = 0.0, message = "Duration must be positive"))]
    pub duration: Option<f64>,
    #[validate(length(min = 1, message = "Track title is required"))]
    pub title: String,
    pub genre: Option<String>,
    #[validate(range(min = 1, max = 300, message = "BPM must be between 1 and 300"))]
    pub bpm: Option<i32>,
    pub key: Option<String>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

fn at_most_max_tracks(tracks: &[TrackPayload]) -> Result<(), ValidationError> {
    if tracks.len() > MAX_TRACKS {
        return Err(ValidationError::new("max_tracks"));
    }
    Ok(())
}

fn require_https(value: &str) -> Result<(), ValidationError> {
    if value.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::new("https"))
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Dotted camelCase path, e.g. `tracks[0].secureUrl`.
    pub field: String,
    pub message: String,
}

/// Every violation found in a submission payload, sorted by field path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid submission data ({} violation(s))", .violations.len())]
pub struct SubmissionValidationError {
    pub violations: Vec<FieldViolation>,
}

impl SubmissionValidationError {
    /// The message shown to the artist on the form.
    pub fn first_message(&self) -> Option<&str> {
        self.violations.first().map(|v| v.message.as_str())
    }

    /// Whether any violation is reported for `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl From<ValidationErrors> for SubmissionValidationError {
    fn from(errors: ValidationErrors) -> Self {
        let mut violations = Vec::new();
        collect_violations("", &errors, &mut violations);
        violations.sort_by(|a, b| a.field.cmp(&b.field));
        Self { violations }
    }
}

fn collect_violations(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldViolation>) {
    for (field, kind) in errors.errors() {
        let name = camel_case(field);
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}.{name}")
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", err.code));
                    out.push(FieldViolation {
                        field: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_violations(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect_violations(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}

/// `secure_url` -> `secureUrl`, so paths match the wire field names.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn trimmed(value: String) -> String {
    let t = value.trim();
    if t.len() == value.len() {
        value
    } else {
        t.to_string()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(trimmed).filter(|v| !v.is_empty())
}

impl SubmissionPayload {
    fn normalized(self) -> Self {
        Self {
            name: trimmed(self.name),
            email: trimmed(self.email),
            phone: non_empty(self.phone),
            instagram: non_empty(self.instagram),
            soundcloud: non_empty(self.soundcloud),
            spotify: non_empty(self.spotify),
            bio: non_empty(self.bio),
            tracks: self.tracks.into_iter().map(TrackPayload::normalized).collect(),
        }
    }
}

impl TrackPayload {
    fn normalized(self) -> Self {
        Self {
            public_id: trimmed(self.public_id),
            secure_url: trimmed(self.secure_url),
            stream_url: non_empty(self.stream_url),
            format: trimmed(self.format).to_lowercase(),
            bytes: self.bytes,
            duration: self.duration,
            title: trimmed(self.title),
            genre: non_empty(self.genre),
            bpm: self.bpm,
            key: non_empty(self.key),
            description: non_empty(self.description),
        }
    }

    fn into_new_track(self) -> NewTrack {
        NewTrack {
            file_type: format!("audio/{}", self.format),
            title: self.title,
            genre: self.genre,
            bpm: self.bpm,
            musical_key: self.key,
            description: self.description,
            file_url: self.secure_url,
            stream_url: self.stream_url,
            public_id: self.public_id,
            file_size: self.bytes,
            duration: self.duration,
        }
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Normalize and validate a raw submission payload.
pub fn validate_submission(
    payload: SubmissionPayload,
) -> Result<NewSubmission, SubmissionValidationError> {
    let payload = payload.normalized();
    payload.validate()?;

    Ok(NewSubmission {
        artist: NewArtist {
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            instagram: payload.instagram,
            soundcloud: payload.soundcloud,
            spotify: payload.spotify,
            bio: payload.bio,
        },
        tracks: payload
            .tracks
            .into_iter()
            .map(TrackPayload::into_new_track)
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_track() -> TrackPayload {
        TrackPayload {
            public_id: "music-demos/abc123".into(),
            secure_url: "https://res.cloudinary.com/demo/video/upload/abc123.mp3".into(),
            stream_url: None,
            format: "mp3".into(),
            bytes: 4_200_000,
            duration: Some(215.4),
            title: "Night Drive".into(),
            genre: Some("Techno".into()),
            bpm: Some(128),
            key: Some("A minor".into()),
            description: None,
        }
    }

    fn valid_payload() -> SubmissionPayload {
        SubmissionPayload {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: None,
            instagram: Some("https://instagram.com/janedoe".into()),
            soundcloud: Some(String::new()),
            spotify: None,
            bio: Some("Producer from Berlin".into()),
            tracks: vec![valid_track()],
        }
    }

    #[test]
    fn valid_payload_is_normalized() {
        let mut payload = valid_payload();
        payload.name = "  Jane Doe ".into();
        payload.tracks[0].title = " Night Drive  ".into();
        payload.tracks[0].format = "MP3".into();

        let submission = validate_submission(payload).expect("payload should validate");
        assert_eq!(submission.artist.name, "Jane Doe");
        assert_eq!(submission.artist.soundcloud, None, "empty link collapses to None");
        assert_eq!(submission.tracks[0].title, "Night Drive");
        assert_eq!(submission.tracks[0].file_type, "audio/mp3");
        assert_eq!(submission.tracks[0].musical_key.as_deref(), Some("A minor"));
        assert_eq!(
            submission.tracks[0].file_url,
            "https://res.cloudinary.com/demo/video/upload/abc123.mp3"
        );
    }

    #[test]
    fn zero_tracks_is_a_validation_failure() {
        let mut payload = valid_payload();
        payload.tracks.clear();

        let err = validate_submission(payload).unwrap_err();
        assert!(err.has_field("tracks"));
        assert_eq!(err.first_message(), Some("Please upload at least one track"));
    }

    #[test]
    fn too_many_tracks_is_a_validation_failure() {
        let mut payload = valid_payload();
        payload.tracks = vec![valid_track(); MAX_TRACKS];
        assert!(validate_submission(payload.clone()).is_ok());

        payload.tracks.push(valid_track());
        let err = validate_submission(payload).unwrap_err();
        assert!(err.has_field("tracks"));
        assert_eq!(err.first_message(), Some("Please upload at most 20 tracks"));
    }

    #[test]
    fn every_violation_is_reported() {
        let mut payload = valid_payload();
        payload.name = "J".into();
        payload.email = "not-an-email".into();
        payload.spotify = Some("spotify artist page".into());
        payload.bio = Some("x".repeat(1001));

        let err = validate_submission(payload).unwrap_err();
        assert!(err.has_field("name"));
        assert!(err.has_field("email"));
        assert!(err.has_field("spotify"));
        assert!(err.has_field("bio"));
        assert_eq!(err.violations.len(), 4);
    }

    #[test]
    fn nested_track_violations_carry_index_paths() {
        let mut second = valid_track();
        second.title = "   ".into();
        second.public_id = String::new();
        second.bytes = 0;
        second.bpm = Some(301);
        second.secure_url = "http://insecure.example.com/a.mp3".into();
        second.description = Some("d".repeat(501));

        let mut payload = valid_payload();
        payload.tracks.push(second);

        let err = validate_submission(payload).unwrap_err();
        for field in [
            "tracks[1].title",
            "tracks[1].publicId",
            "tracks[1].bytes",
            "tracks[1].bpm",
            "tracks[1].secureUrl",
            "tracks[1].description",
        ] {
            assert!(err.has_field(field), "missing violation for {field}");
        }
        assert!(
            !err.violations.iter().any(|v| v.field.starts_with("tracks[0]")),
            "first track is valid"
        );
    }

    #[test]
    fn bpm_bounds_are_inclusive() {
        for bpm in [MIN_BPM, MAX_BPM] {
            let mut payload = valid_payload();
            payload.tracks[0].bpm = Some(bpm);
            assert!(validate_submission(payload).is_ok(), "bpm {bpm} should pass");
        }
        let mut payload = valid_payload();
        payload.tracks[0].bpm = Some(0);
        assert!(validate_submission(payload).unwrap_err().has_field("tracks[0].bpm"));
    }

    #[test]
    fn missing_fields_deserialize_and_fail_validation() {
        let payload: SubmissionPayload =
            serde_json::from_value(serde_json::json!({ "email": "a@b.co" })).unwrap();
        let err = validate_submission(payload).unwrap_err();
        assert!(err.has_field("name"));
        assert!(err.has_field("tracks"));
    }

    #[test]
    fn camel_case_converts_snake_names() {
        assert_eq!(camel_case("secure_url"), "secureUrl");
        assert_eq!(camel_case("tracks"), "tracks");
    }
}
