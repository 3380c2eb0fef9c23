//! Handlers for the `/reservations` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use unilib_core::reservation::ReservationStatus;
use unilib_core::types::DbId;
use unilib_db::models::reservation::{Reservation, ReservationCounts, ReservationDetail};
use unilib_db::repositories::ReservationRepo;
use unilib_lifecycle::ReserveRequest;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::non_blank;
use crate::response::{DataResponse, ListWithSummary};
use crate::state::AppState;

/// Query parameters for `GET /reservations`.
#[derive(Debug, Deserialize)]
pub struct ReservationQuery {
    /// `PENDING`, `AVAILABLE`, `CANCELLED` or `COMPLETED`.
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/reservations
pub async fn list_reservations(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ReservationQuery>,
) -> AppResult<Json<DataResponse<ListWithSummary<ReservationDetail, ReservationCounts>>>> {
    let status = non_blank(params.status)
        .map(|s| s.to_uppercase().parse::<ReservationStatus>())
        .transpose()?;

    let reservations = ReservationRepo::list(
        &state.pool,
        auth.scope(),
        status,
        unilib_db::clamp_limit(params.limit),
        unilib_db::clamp_offset(params.offset),
    )
    .await?;
    let counts = ReservationRepo::counts(&state.pool, auth.scope()).await?;

    Ok(Json(DataResponse {
        data: ListWithSummary {
            items: reservations,
            summary: counts,
        },
    }))
}

/// POST /api/v1/reservations
pub async fn create_reservation(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ReserveRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Reservation>>)> {
    let reservation = state.lifecycle.reserve(auth.actor(), &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: reservation })))
}

/// POST /api/v1/reservations/{id}/cancel
pub async fn cancel_reservation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Reservation>>> {
    let reservation = state.lifecycle.cancel_reservation(auth.actor(), id).await?;
    Ok(Json(DataResponse { data: reservation }))
}
