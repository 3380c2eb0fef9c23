//! Route definitions for the `/fines` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::fines;
use crate::state::AppState;

/// Routes mounted at `/fines`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(fines::list_fines))
        .route("/{id}", get(fines::get_fine))
        .route("/{id}/pay", post(fines::pay_fine))
}
