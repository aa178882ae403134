//! Handlers for the `/submissions` resource.
//!
//! Creation is public (the artist-facing form); everything else requires a
//! staff token.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use intake_core::error::CoreError;
use intake_core::query::{PaginationMeta, SubmissionListParams};
use intake_core::submission::SubmissionStatus;
use intake_core::types::DbId;
use intake_core::validation::{validate_submission, SubmissionPayload};
use intake_db::models::review::{CreateReview, Review};
use intake_db::models::submission::SubmissionDetail;
use intake_db::repositories::{ReviewRepo, SubmissionRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::response::{
    CreateSubmissionResponse, DataResponse, MessageResponse, SubmissionListResponse,
};
use crate::state::AppState;

/// Inclusive bounds for a review grade.
const MIN_GRADE: i32 = 1;
const MAX_GRADE: i32 = 10;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `PATCH /submissions/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: SubmissionStatus,
}

/// Request body for `POST /submissions/{id}/reviews`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub grade: Option<i32>,
    pub feedback: String,
    pub internal_notes: Option<String>,
}

fn bad_json(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Submission",
        id,
    })
}

// ---------------------------------------------------------------------------
// Public intake
// ---------------------------------------------------------------------------

/// POST /api/v1/submissions
///
/// Validate, confirm the uploads with the media store, then persist. The
/// confirmation email and the `new-submission` event are dispatched after
/// the commit and never affect the response.
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<SubmissionPayload>, JsonRejection>,
) -> AppResult<Json<CreateSubmissionResponse>> {
    let Json(payload) = body.map_err(bad_json)?;

    let submission = validate_submission(payload).map_err(CoreError::from)?;

    let public_ids = submission.public_ids();
    state
        .media
        .confirm(&public_ids)
        .await
        .map_err(|e| AppError::Upstream(format!("Upload confirmation failed: {e}")))?;

    let detail = SubmissionRepo::create(&state.pool, &submission).await?;

    tracing::info!(
        submission_id = detail.id,
        artist_id = detail.artist.id,
        tracks = detail.tracks.len(),
        "Submission received"
    );

    state.notifier.submission_created(&detail);

    Ok(Json(CreateSubmissionResponse {
        success: true,
        submission_id: detail.id,
        message: "Submission received successfully",
    }))
}

// ---------------------------------------------------------------------------
// Review console
// ---------------------------------------------------------------------------

/// GET /api/v1/submissions
pub async fn list(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<SubmissionListParams>,
) -> AppResult<Json<SubmissionListResponse<SubmissionDetail>>> {
    let (query, filters) = params.to_query()?;

    let (items, total_count) = SubmissionRepo::list(&state.pool, &query).await?;

    Ok(Json(SubmissionListResponse {
        success: true,
        data: items,
        pagination: PaginationMeta::compute(query.page, total_count),
        filters,
        sorting: query.sort,
    }))
}

/// GET /api/v1/submissions/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SubmissionDetail>>> {
    let detail = SubmissionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse::new(detail)))
}

/// PATCH /api/v1/submissions/{id}/status
///
/// Any status may move to any other. Concurrent updates are last-write-wins.
pub async fn update_status(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse<SubmissionDetail>>> {
    let Json(input) = body.map_err(bad_json)?;

    let detail = SubmissionRepo::update_status(&state.pool, id, input.status)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(
        submission_id = id,
        status = %detail.status,
        user_id = user.user_id,
        "Submission status updated"
    );

    state.notifier.status_changed(&detail);

    Ok(Json(MessageResponse {
        success: true,
        message: format!("Submission status updated to {}", detail.status),
        data: detail,
    }))
}

/// POST /api/v1/submissions/{id}/reviews
///
/// Records a review by the signed-in staff member. Decision emails read the
/// latest review, so staff review first and then approve or reject.
pub async fn create_review(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    body: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<Review>>> {
    let Json(input) = body.map_err(bad_json)?;

    let feedback = input.feedback.trim().to_string();
    if feedback.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Feedback is required".into(),
        )));
    }
    if let Some(grade) = input.grade {
        if !(MIN_GRADE..=MAX_GRADE).contains(&grade) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Grade must be between {MIN_GRADE} and {MAX_GRADE}"
            ))));
        }
    }

    if SubmissionRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(not_found(id));
    }

    let review = ReviewRepo::create(
        &state.pool,
        &CreateReview {
            submission_id: id,
            reviewer_id: user.user_id,
            grade: input.grade,
            feedback,
            internal_notes: input
                .internal_notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        },
    )
    .await?;

    tracing::info!(
        submission_id = id,
        review_id = review.id,
        user_id = user.user_id,
        "Review recorded"
    );

    Ok(Json(DataResponse::new(review)))
}
