//! Handlers for the `/auth` resource (register, login, own profile, password change).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use unilib_core::error::CoreError;
use unilib_core::roles::Role;
use unilib_db::models::user::{CreateUser, UpdateUser, UserResponse};
use unilib_db::repositories::UserRepo;
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150, message = "must be 3 to 150 characters"))]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(length(max = 150))]
    pub first_name: String,
    #[validate(length(max = 150))]
    pub last_name: String,
    #[validate(length(min = 1, max = 20, message = "must be 1 to 20 characters"))]
    pub university_id: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// `STUDENT` (default) or `FACULTY`.
    pub role: Option<Role>,
}

/// Request body for `POST /auth/login`. `login` accepts a username or email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    pub login: String,
    pub password: String,
}

/// Request body for `PUT /auth/me`. Role and activation stay admin-managed.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, max = 20, message = "must be 1 to 20 characters"))]
    pub university_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Request body for `POST /auth/password`.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub new_password: String,
}

/// Successful authentication response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Self-registration. Only the self-service roles can be chosen here;
/// staff accounts are created by an admin.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    input.validate()?;

    let role = input.role.unwrap_or(Role::Student);
    if !role.is_self_service() {
        return Err(AppError::Core(CoreError::Validation(
            "You can only register as a student or faculty member".into(),
        )));
    }

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
            role,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %role, "User registered");

    let response = auth_response(&state, &user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
///
/// Authenticate with username or email (case-insensitive) plus password.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_login(&state.pool, input.login.trim())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid username or password".into(),
            ))
        })?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        )));
    }

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    Ok(Json(auth_response(&state, &user)?))
}

/// GET /api/v1/auth/me
pub async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("User", auth.user_id)))?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// PUT /api/v1/auth/me
pub async fn update_me(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input.validate()?;

    let update = UpdateUser {
        email: input.email.map(|e| e.trim().to_string()),
        first_name: input.first_name,
        last_name: input.last_name,
        university_id: input.university_id.map(|id| id.trim().to_string()),
        phone: input.phone,
        address: input.address,
        role: None,
        is_active: None,
    };
    let user = UserRepo::update(&state.pool, auth.user_id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("User", auth.user_id)))?;

    tracing::info!(user_id = user.id, "Profile updated");
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// POST /api/v1/auth/password
///
/// The current password must be supplied; existing tokens stay valid.
pub async fn change_password(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    input.validate()?;

    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("User", auth.user_id)))?;

    let current_valid = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_valid {
        return Err(AppError::Core(CoreError::Validation(
            "current_password: is incorrect".into(),
        )));
    }
    if input.new_password == input.current_password {
        return Err(AppError::Core(CoreError::Validation(
            "new_password: must differ from the current password".into(),
        )));
    }

    let password_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, user.id, &password_hash).await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn auth_response(
    state: &AppState,
    user: &unilib_db::models::user::User,
) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(AuthResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserResponse::from(user),
    })
}
