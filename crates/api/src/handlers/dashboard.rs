//! Handler for `GET /dashboard`: a staff overview or a personal summary,
//! depending on the caller's role.

use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use unilib_db::models::borrow::{BorrowDetail, BorrowStats};
use unilib_db::models::dashboard::{LibraryTotals, PopularBook};
use unilib_db::models::reservation::ReservationDetail;
use unilib_db::repositories::{BorrowRepo, DashboardRepo, FineRepo, ReservationRepo};

use super::today;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Rows shown in each dashboard panel.
const PANEL_SIZE: i64 = 5;

#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Dashboard {
    Staff(StaffDashboard),
    Personal(PersonalDashboard),
}

#[derive(Debug, Serialize)]
pub struct StaffDashboard {
    pub totals: LibraryTotals,
    /// Share of all reservations still pending, in whole percent.
    pub pending_reservation_percentage: i64,
    pub recent_borrows: Vec<BorrowDetail>,
    pub overdue_borrows: Vec<BorrowDetail>,
    pub popular_books: Vec<PopularBook>,
    pub recent_reservations: Vec<ReservationDetail>,
}

#[derive(Debug, Serialize)]
pub struct PersonalDashboard {
    pub borrow_stats: BorrowStats,
    pub active_borrows: Vec<BorrowDetail>,
    /// Ordered PENDING, AVAILABLE, COMPLETED, CANCELLED.
    pub reservations: Vec<ReservationDetail>,
    pub unpaid_fines: Decimal,
}

/// GET /api/v1/dashboard
pub async fn dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Dashboard>>> {
    let today = today();

    let data = if auth.role.is_staff() {
        let totals = DashboardRepo::library_totals(&state.pool).await?;
        let counts = ReservationRepo::counts(&state.pool, None).await?;
        Dashboard::Staff(StaffDashboard {
            totals,
            pending_reservation_percentage: counts.pending_percentage(),
            recent_borrows: BorrowRepo::recent(&state.pool, PANEL_SIZE).await?,
            overdue_borrows: BorrowRepo::overdue(&state.pool, today, PANEL_SIZE).await?,
            popular_books: DashboardRepo::popular_books(&state.pool, PANEL_SIZE).await?,
            recent_reservations: ReservationRepo::recent(&state.pool, PANEL_SIZE).await?,
        })
    } else {
        let fines = FineRepo::totals(&state.pool, Some(auth.user_id)).await?;
        Dashboard::Personal(PersonalDashboard {
            borrow_stats: BorrowRepo::stats(&state.pool, Some(auth.user_id), today).await?,
            active_borrows: BorrowRepo::active_for_user(&state.pool, auth.user_id).await?,
            reservations: ReservationRepo::list_for_dashboard(&state.pool, auth.user_id, PANEL_SIZE)
                .await?,
            unpaid_fines: fines.total_pending,
        })
    };

    Ok(Json(DataResponse { data }))
}
