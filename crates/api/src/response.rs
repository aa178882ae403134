//! Shared response envelope types for API handlers.
//!
//! Submission endpoints answer with a `{ "success": true, ... }` envelope.
//! Use these types instead of ad-hoc `serde_json::json!` bodies.

use intake_core::query::{AppliedFilters, PaginationMeta, Sort};
use intake_core::types::DbId;
use serde::Serialize;

/// Standard `{ "success": true, "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse::new(detail)))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Envelope for a mutation that also returns the updated resource.
#[derive(Debug, Serialize)]
pub struct MessageResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

/// Reply to a public submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionResponse {
    pub success: bool,
    pub submission_id: DbId,
    pub message: &'static str,
}

/// One page of submissions with the metadata needed to render pager,
/// filter chips, and sort indicators.
#[derive(Debug, Serialize)]
pub struct SubmissionListResponse<T: Serialize> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
    pub filters: AppliedFilters,
    pub sorting: Sort,
}
