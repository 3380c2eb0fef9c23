//! Handlers for the `/books` resource.
//!
//! Reads are open to every authenticated user; writes require staff.

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use unilib_core::catalog::{
    validate_isbn, validate_required_text, Availability, BookSort, CopyCounts, MAX_AUTHOR_LENGTH,
    MAX_TITLE_LENGTH,
};
use unilib_core::error::CoreError;
use unilib_core::types::DbId;
use unilib_db::models::book::{Book, BookFilter, BookListItem, CreateBook, UpdateBook};
use unilib_db::repositories::BookRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStaff;
use crate::query::non_blank;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /books`.
#[derive(Debug, Deserialize)]
pub struct BookQuery {
    /// Matches title, author or ISBN.
    pub q: Option<String>,
    pub category_id: Option<DbId>,
    /// `available` or `unavailable`; anything else is ignored.
    pub availability: Option<String>,
    /// `title`, `-title`, `-created_at` (default) or `popular`.
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A listed book plus whether the caller currently holds a copy.
#[derive(Debug, Serialize)]
pub struct BookListView {
    #[serde(flatten)]
    pub item: BookListItem,
    pub is_borrowed_by_me: bool,
}

/// A single book plus whether the caller currently holds a copy.
#[derive(Debug, Serialize)]
pub struct BookView {
    #[serde(flatten)]
    pub book: Book,
    pub is_borrowed_by_me: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/books
pub async fn list_books(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BookQuery>,
) -> AppResult<Json<DataResponse<Vec<BookListView>>>> {
    let filter = BookFilter {
        search: non_blank(params.q),
        category_id: params.category_id,
        availability: params.availability.as_deref().and_then(Availability::parse),
        sort: BookSort::parse(params.sort.as_deref()),
        limit: unilib_db::clamp_limit(params.limit),
        offset: unilib_db::clamp_offset(params.offset),
    };

    let items = BookRepo::list(&state.pool, &filter).await?;
    let borrowed: HashSet<DbId> = BookRepo::borrowed_ids_for_user(&state.pool, auth.user_id)
        .await?
        .into_iter()
        .collect();

    let data = items
        .into_iter()
        .map(|item| BookListView {
            is_borrowed_by_me: borrowed.contains(&item.book.id),
            item,
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/books/{id}
pub async fn get_book(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<BookView>>> {
    let book = BookRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Book", id)))?;
    let is_borrowed_by_me = BookRepo::borrowed_ids_for_user(&state.pool, auth.user_id)
        .await?
        .contains(&id);
    Ok(Json(DataResponse {
        data: BookView {
            book,
            is_borrowed_by_me,
        },
    }))
}

/// POST /api/v1/books
///
/// Available copies always start equal to total copies.
pub async fn create_book(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<DataResponse<Book>>)> {
    validate_required_text("Title", &input.title, MAX_TITLE_LENGTH)?;
    validate_required_text("Author", &input.author, MAX_AUTHOR_LENGTH)?;
    validate_isbn(&input.isbn)?;
    let counts = CopyCounts::new_book(input.total_copies)?;

    let book = BookRepo::create(&state.pool, &input, counts).await?;
    tracing::info!(book_id = book.id, isbn = %book.isbn, created_by = staff.user_id, "Book created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: book })))
}

/// PUT /api/v1/books/{id}
///
/// Lowering `total_copies` below the available count clamps it down; an
/// explicit `available_copies` above the total is rejected.
pub async fn update_book(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateBook>,
) -> AppResult<Json<DataResponse<Book>>> {
    if let Some(title) = &input.title {
        validate_required_text("Title", title, MAX_TITLE_LENGTH)?;
    }
    if let Some(author) = &input.author {
        validate_required_text("Author", author, MAX_AUTHOR_LENGTH)?;
    }
    if let Some(isbn) = &input.isbn {
        validate_isbn(isbn)?;
    }

    // The lock keeps a concurrent issue or return from racing the copy counts.
    let mut tx = state.pool.begin().await?;
    let current = BookRepo::lock_by_id(&mut *tx, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Book", id)))?;

    let counts = current
        .copy_counts()
        .update(input.total_copies, input.available_copies)?;
    input.total_copies = Some(counts.total);
    input.available_copies = Some(counts.available);

    let book = BookRepo::update(&mut *tx, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Book", id)))?;
    tx.commit().await?;

    tracing::info!(
        book_id = id,
        total = counts.total,
        available = counts.available,
        updated_by = staff.user_id,
        "Book updated"
    );
    Ok(Json(DataResponse { data: book }))
}

/// DELETE /api/v1/books/{id}
pub async fn delete_book(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !BookRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::not_found("Book", id)));
    }
    tracing::info!(book_id = id, deleted_by = staff.user_id, "Book deleted");
    Ok(StatusCode::NO_CONTENT)
}
