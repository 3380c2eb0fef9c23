//! Handlers for the `/fines` resource.

use axum::extract::{Path, Query, State};
use axum::Json;
use unilib_core::error::CoreError;
use unilib_core::roles;
use unilib_core::types::DbId;
use unilib_db::models::fine::{Fine, FineDetail, FineTotals};
use unilib_db::repositories::FineRepo;

use super::today;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::{DataResponse, ListWithSummary};
use crate::state::AppState;

/// GET /api/v1/fines
///
/// Runs the overdue sweep first so freshly overdue borrows show up with
/// their fine. A failed sweep is logged and the listing still succeeds.
pub async fn list_fines(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<ListWithSummary<FineDetail, FineTotals>>>> {
    if let Err(e) = state.lifecycle.sweep_overdue(today()).await {
        tracing::warn!(error = %e, "Overdue sweep before fine listing failed");
    }

    let fines = FineRepo::list(&state.pool, auth.scope(), params.limit(), params.offset()).await?;
    let totals = FineRepo::totals(&state.pool, auth.scope()).await?;

    Ok(Json(DataResponse {
        data: ListWithSummary {
            items: fines,
            summary: totals,
        },
    }))
}

/// GET /api/v1/fines/{id}
pub async fn get_fine(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<FineDetail>>> {
    let fine = FineRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Fine", id)))?;
    if !roles::can_view(auth.user_id, auth.role, fine.fine.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You don't have permission to view this fine".into(),
        )));
    }
    Ok(Json(DataResponse { data: fine }))
}

/// POST /api/v1/fines/{id}/pay
///
/// Records an in-person payment. Staff only.
pub async fn pay_fine(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Fine>>> {
    let fine = state.lifecycle.pay_fine(auth.actor(), id).await?;
    Ok(Json(DataResponse { data: fine }))
}
