//! Route definitions for the `/borrows` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::borrows;
use crate::state::AppState;

/// Routes mounted at `/borrows`.
///
/// ```text
/// GET  /                  -> list_borrows
/// POST /                  -> issue_borrow
/// GET  /{id}              -> get_borrow
/// POST /{id}/return       -> return_borrow
/// POST /{id}/check-fine   -> check_fine
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(borrows::list_borrows).post(borrows::issue_borrow))
        .route("/{id}", get(borrows::get_borrow))
        .route("/{id}/return", post(borrows::return_borrow))
        .route("/{id}/check-fine", post(borrows::check_fine))
}
