//! Route definitions for the `/reservations` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::reservations;
use crate::state::AppState;

/// Routes mounted at `/reservations`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(reservations::list_reservations).post(reservations::create_reservation),
        )
        .route("/{id}/cancel", post(reservations::cancel_reservation))
}
