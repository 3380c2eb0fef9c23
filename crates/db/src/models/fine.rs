//! Fine entity model and listing types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unilib_core::fine::FineStatus;
use unilib_core::types::{DbId, Timestamp};

/// A row from the `fines` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Fine {
    pub id: DbId,
    pub user_id: DbId,
    pub borrow_id: DbId,
    pub amount: Decimal,
    pub is_paid: bool,
    pub created_at: Timestamp,
    pub paid_at: Option<Timestamp>,
}

impl Fine {
    pub fn status(&self) -> FineStatus {
        FineStatus::from_flag(self.is_paid)
    }
}

/// A fine joined with its borrow, book and user for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FineDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fine: Fine,
    pub book_id: DbId,
    pub book_title: String,
    pub user_name: String,
    pub due_date: chrono::NaiveDate,
    pub is_returned: bool,
}

/// Sums of pending and paid fine amounts.
#[derive(Debug, Clone, Default, FromRow, Serialize, PartialEq)]
pub struct FineTotals {
    pub total_pending: Decimal,
    pub total_paid: Decimal,
}
