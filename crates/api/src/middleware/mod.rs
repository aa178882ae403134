//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated staff user from a JWT Bearer token.
//! - [`rbac::RequireStaff`] -- Requires a review-console role (`admin` or `reviewer`).
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.

pub mod auth;
pub mod rbac;
