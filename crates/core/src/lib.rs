//! Domain core for the demo submission intake portal.
//!
//! Pure logic only: no database, network, or runtime dependencies. Shared by
//! the persistence layer, the HTTP server, and the admin sync client.

pub mod error;
pub mod query;
pub mod realtime;
pub mod roles;
pub mod submission;
pub mod templating;
pub mod types;
pub mod validation;
