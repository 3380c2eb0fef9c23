//! Handlers for the `/categories` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use unilib_core::catalog::validate_required_text;
use unilib_core::error::CoreError;
use unilib_core::types::DbId;
use unilib_db::models::book::Book;
use unilib_db::models::category::{Category, CreateCategory, UpdateCategory};
use unilib_db::repositories::{BookRepo, CategoryRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum category name length.
const MAX_NAME_LENGTH: usize = 100;

/// A category with the books filed under it.
#[derive(Debug, Serialize)]
pub struct CategoryWithBooks {
    #[serde(flatten)]
    pub category: Category,
    pub books: Vec<Book>,
}

/// GET /api/v1/categories
pub async fn list_categories(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Category>>>> {
    let categories = CategoryRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// GET /api/v1/categories/{id}
pub async fn get_category(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<CategoryWithBooks>>> {
    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Category", id)))?;
    let books = BookRepo::list_by_category(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: CategoryWithBooks { category, books },
    }))
}

/// POST /api/v1/categories
pub async fn create_category(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<DataResponse<Category>>)> {
    validate_required_text("Name", &input.name, MAX_NAME_LENGTH)?;
    let category = CategoryRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PUT /api/v1/categories/{id}
pub async fn update_category(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<Json<DataResponse<Category>>> {
    if let Some(name) = &input.name {
        validate_required_text("Name", name, MAX_NAME_LENGTH)?;
    }
    let category = CategoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Category", id)))?;
    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/v1/categories/{id}
///
/// Books in the category are kept and lose their category.
pub async fn delete_category(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !CategoryRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::not_found("Category", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
