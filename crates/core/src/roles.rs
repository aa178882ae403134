//! Staff roles. The names must match the `CHECK` constraint on `users.role`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_REVIEWER: &str = "reviewer";

/// Roles allowed into the review console.
pub const STAFF_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_REVIEWER];

/// Whether `role` may use the review console.
pub fn is_staff(role: &str) -> bool {
    STAFF_ROLES.contains(&role)
}
