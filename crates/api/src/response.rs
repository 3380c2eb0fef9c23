//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Use [`DataResponse`]
//! instead of ad-hoc `serde_json::json!({ "data": ... })`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// A list page together with the aggregate figures shown above it.
#[derive(Debug, Serialize)]
pub struct ListWithSummary<T: Serialize, S: Serialize> {
    pub items: Vec<T>,
    pub summary: S,
}
