//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireStaff`] -- requires `ADMIN` or `LIBRARIAN`.
//! - [`rbac::RequireAdmin`] -- requires `ADMIN`.

pub mod auth;
pub mod rbac;
