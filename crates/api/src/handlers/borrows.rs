//! Handlers for the `/borrows` resource.
//!
//! Staff see every borrow; students and faculty see only their own.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use unilib_core::borrow::BorrowFilter;
use unilib_core::error::CoreError;
use unilib_core::fine::FineStatus;
use unilib_core::roles;
use unilib_core::types::{Date, DbId};
use unilib_db::models::borrow::{Borrow, BorrowDetail, BorrowListFilter, BorrowStats};
use unilib_db::repositories::BorrowRepo;
use unilib_lifecycle::IssueRequest;

use super::today;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::non_blank;
use crate::response::{DataResponse, ListWithSummary};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /borrows`.
#[derive(Debug, Deserialize)]
pub struct BorrowQuery {
    pub search: Option<String>,
    /// `active`, `overdue` or `returned`.
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A borrow with its overdue state as of today.
#[derive(Debug, Serialize)]
pub struct BorrowView {
    #[serde(flatten)]
    pub detail: BorrowDetail,
    pub is_overdue: bool,
    pub overdue_days: i64,
}

impl BorrowView {
    fn new(detail: BorrowDetail, today: Date) -> Self {
        Self {
            is_overdue: detail.borrow.is_overdue(today),
            overdue_days: detail.borrow.overdue_days(today),
            detail,
        }
    }
}

/// Response body for a successful return.
#[derive(Debug, Serialize)]
pub struct ReturnView {
    pub borrow: Borrow,
    pub fine_status: Option<FineStatus>,
    /// Reservation moved to AVAILABLE by this return.
    pub promoted_reservation_id: Option<DbId>,
    pub message: String,
}

/// Response body for `POST /borrows/{id}/check-fine`.
#[derive(Debug, Serialize)]
pub struct FineCheckView {
    pub fine_created: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/borrows
pub async fn list_borrows(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BorrowQuery>,
) -> AppResult<Json<DataResponse<ListWithSummary<BorrowView, BorrowStats>>>> {
    let status = non_blank(params.status)
        .map(|s| s.parse::<BorrowFilter>())
        .transpose()?;
    let today = today();

    let filter = BorrowListFilter {
        user_id: auth.scope(),
        search: non_blank(params.search),
        status,
        limit: unilib_db::clamp_limit(params.limit),
        offset: unilib_db::clamp_offset(params.offset),
    };

    let borrows = BorrowRepo::list(&state.pool, &filter, today).await?;
    let stats = BorrowRepo::stats(&state.pool, auth.scope(), today).await?;

    Ok(Json(DataResponse {
        data: ListWithSummary {
            items: borrows
                .into_iter()
                .map(|d| BorrowView::new(d, today))
                .collect(),
            summary: stats,
        },
    }))
}

/// GET /api/v1/borrows/{id}
pub async fn get_borrow(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<BorrowView>>> {
    let detail = BorrowRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Borrow", id)))?;
    if !roles::can_view(auth.user_id, auth.role, detail.borrow.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You don't have permission to view this borrow".into(),
        )));
    }
    Ok(Json(DataResponse {
        data: BorrowView::new(detail, today()),
    }))
}

/// POST /api/v1/borrows
///
/// Students and faculty borrow for themselves with the default loan
/// period; staff may name a borrower and a due date.
pub async fn issue_borrow(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<IssueRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Borrow>>)> {
    let borrow = state.lifecycle.issue(auth.actor(), &input, today()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: borrow })))
}

/// POST /api/v1/borrows/{id}/return
pub async fn return_borrow(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReturnView>>> {
    let outcome = state
        .lifecycle
        .return_borrow(auth.actor(), id, today())
        .await?;
    Ok(Json(DataResponse {
        data: ReturnView {
            borrow: outcome.borrow,
            fine_status: outcome.fine_status,
            promoted_reservation_id: outcome.promoted.map(|r| r.id),
            message: outcome.message,
        },
    }))
}

/// POST /api/v1/borrows/{id}/check-fine
///
/// Evaluate one borrow for an overdue fine right away.
pub async fn check_fine(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<FineCheckView>>> {
    let borrow = BorrowRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Borrow", id)))?;
    if !roles::can_view(auth.user_id, auth.role, borrow.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You don't have permission to view this borrow".into(),
        )));
    }
    let fine_created = state
        .lifecycle
        .check_and_create_fine_by_id(borrow.id, today())
        .await?;
    Ok(Json(DataResponse {
        data: FineCheckView { fine_created },
    }))
}
