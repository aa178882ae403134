//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and, where the row is written through the API, a create DTO.

pub mod artist;
pub mod email_template;
pub mod review;
pub mod submission;
pub mod track;
pub mod user;
