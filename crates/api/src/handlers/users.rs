//! Admin-only user management under `/users`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use unilib_core::error::CoreError;
use unilib_core::roles::Role;
use unilib_core::types::DbId;
use unilib_db::models::user::{CreateUser, UpdateUser, UserResponse};
use unilib_db::repositories::UserRepo;
use validator::Validate;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::non_blank;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /users`.
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    /// Matches username, email, names and university ID.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for `POST /users`. Any role may be assigned.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 150, message = "must be 3 to 150 characters"))]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(length(min = 1, max = 20, message = "must be 1 to 20 characters"))]
    pub university_id: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
}

/// GET /api/v1/users
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<UserListQuery>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let search = non_blank(params.search);
    let users = UserRepo::list(
        &state.pool,
        search.as_deref(),
        unilib_db::clamp_limit(params.limit),
        unilib_db::clamp_offset(params.offset),
    )
    .await?;
    Ok(Json(DataResponse {
        data: users.iter().map(UserResponse::from).collect(),
    }))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("User", id)))?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// POST /api/v1/users
pub async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    input.validate()?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username.trim().to_string(),
            email: input.email.trim().to_string(),
            first_name: input.first_name,
            last_name: input.last_name,
            university_id: input.university_id.trim().to_string(),
            phone: input.phone,
            address: input.address,
            password_hash,
            role: input.role,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %input.role, created_by = admin.user_id, "User created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// PUT /api/v1/users/{id}
pub async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    if id == admin.user_id && input.is_active == Some(false) {
        return Err(AppError::Core(CoreError::Validation(
            "You cannot deactivate your own account".into(),
        )));
    }

    let user = UserRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("User", id)))?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// DELETE /api/v1/users/{id}
///
/// Soft delete: the account is deactivated, its history is kept.
pub async fn deactivate_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(AppError::Core(CoreError::Validation(
            "You cannot deactivate your own account".into(),
        )));
    }
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("User", id)))?;

    if UserRepo::deactivate(&state.pool, id).await? {
        tracing::info!(user_id = id, deactivated_by = admin.user_id, "User deactivated");
    }
    Ok(StatusCode::NO_CONTENT)
}
