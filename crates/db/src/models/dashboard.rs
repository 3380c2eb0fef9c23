//! Aggregate read models for the dashboards.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Library-wide totals shown to staff.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct LibraryTotals {
    pub total_books: i64,
    pub total_borrows: i64,
    pub active_borrows: i64,
    pub total_fines: Decimal,
    pub total_reservations: i64,
    pub pending_reservations: i64,
}

/// A book ranked by how often it has been borrowed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PopularBook {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub borrow_count: i64,
}
