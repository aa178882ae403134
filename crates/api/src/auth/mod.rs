//! Staff authentication primitives.
//!
//! - [`jwt`]: HS256 access-token issuance and validation.
//! - [`password`]: Argon2id password hashing and verification.

pub mod jwt;
pub mod password;
