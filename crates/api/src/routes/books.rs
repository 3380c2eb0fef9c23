//! Route definitions for the `/books` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::books;
use crate::state::AppState;

/// Routes mounted at `/books`.
///
/// ```text
/// GET    /       -> list_books
/// POST   /       -> create_book (staff)
/// GET    /{id}   -> get_book
/// PUT    /{id}   -> update_book (staff)
/// DELETE /{id}   -> delete_book (staff)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(books::list_books).post(books::create_book))
        .route(
            "/{id}",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
}
