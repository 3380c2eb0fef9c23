pub mod auth;
pub mod books;
pub mod borrows;
pub mod categories;
pub mod fines;
pub mod health;
pub mod notifications;
pub mod reservations;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register, /auth/login, /auth/me, /auth/password
///
/// /users, /users/{id}                              admin only
///
/// /categories, /categories/{id}                    writes: staff
/// /books, /books/{id}                              writes: staff
///
/// /borrows                                         list, issue
/// /borrows/{id}                                    detail
/// /borrows/{id}/return                             return
/// /borrows/{id}/check-fine                         evaluate one borrow
///
/// /fines                                           list (runs overdue sweep)
/// /fines/{id}, /fines/{id}/pay                     detail, pay (staff)
///
/// /reservations                                    list, reserve
/// /reservations/{id}/cancel                        cancel
///
/// /notifications                                   own notifications
/// /notifications/unread-count
/// /notifications/read-all
/// /notifications/{id}/read
///
/// /dashboard                                       staff or personal view
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/categories", categories::router())
        .nest("/books", books::router())
        .nest("/borrows", borrows::router())
        .nest("/fines", fines::router())
        .nest("/reservations", reservations::router())
        .nest("/notifications", notifications::router())
        .route("/dashboard", get(handlers::dashboard::dashboard))
}
