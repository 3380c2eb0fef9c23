//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role lacks
//! the permission. Decisions go through [`unilib_core::roles::permits`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use unilib_core::error::CoreError;
use unilib_core::roles::{permits, Action};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires a staff role (may manage the catalog). Rejects with 403 otherwise.
///
/// ```ignore
/// async fn staff_only(RequireStaff(user): RequireStaff) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireStaff(pub AuthUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !permits(user.role, Action::ManageCatalog) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Librarian or Admin role required".into(),
            )));
        }
        Ok(RequireStaff(user))
    }
}

/// Requires the `ADMIN` role (user management). Rejects with 403 otherwise.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !permits(user.role, Action::ManageUsers) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}
