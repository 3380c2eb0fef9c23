//! Handlers for the `/notifications` resource.
//!
//! Every endpoint works on the caller's own notifications only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use unilib_core::error::CoreError;
use unilib_core::types::DbId;
use unilib_db::models::notification::{Notification, NotificationCounts};
use unilib_db::repositories::NotificationRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, ListWithSummary};
use crate::state::AppState;

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

/// GET /api/v1/notifications
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<ListWithSummary<Notification, NotificationCounts>>>> {
    let notifications = NotificationRepo::list_for_user(
        &state.pool,
        auth.user_id,
        params.unread_only.unwrap_or(false),
        unilib_db::clamp_limit(params.limit),
        unilib_db::clamp_offset(params.offset),
    )
    .await?;
    let counts = NotificationRepo::counts(&state.pool, auth.user_id).await?;

    Ok(Json(DataResponse {
        data: ListWithSummary {
            items: notifications,
            summary: counts,
        },
    }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let counts = NotificationRepo::counts(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: UnreadCount {
            unread: counts.unread,
        },
    }))
}

/// POST /api/v1/notifications/{id}/read
///
/// Someone else's notification is reported as not found.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !NotificationRepo::mark_read(&state.pool, id, auth.user_id).await? {
        return Err(AppError::Core(CoreError::not_found("Notification", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MarkedRead>>> {
    let updated = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: MarkedRead { updated },
    }))
}
