//! Borrow entity model, DTOs and listing types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unilib_core::borrow::{self, BorrowFilter, BorrowState};
use unilib_core::types::{Date, DbId, Timestamp};

/// A row from the `borrows` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Borrow {
    pub id: DbId,
    pub user_id: DbId,
    pub book_id: DbId,
    pub issued_by: Option<DbId>,
    pub issue_date: Date,
    pub due_date: Date,
    pub return_date: Option<Date>,
    pub is_returned: bool,
    pub created_at: Timestamp,
}

impl Borrow {
    pub fn state(&self) -> BorrowState {
        BorrowState::from_flag(self.is_returned)
    }

    pub fn is_overdue(&self, today: Date) -> bool {
        borrow::is_overdue(self.is_returned, self.due_date, today)
    }

    pub fn overdue_days(&self, today: Date) -> i64 {
        borrow::overdue_days(self.is_returned, self.due_date, today)
    }
}

/// DTO for inserting a borrow.
#[derive(Debug, Clone)]
pub struct CreateBorrow {
    pub user_id: DbId,
    pub book_id: DbId,
    pub issued_by: Option<DbId>,
    pub issue_date: Date,
    pub due_date: Date,
}

/// A borrow joined with its book, borrower and fine for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BorrowDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub borrow: Borrow,
    pub book_title: String,
    pub book_author: String,
    pub borrower_name: String,
    pub borrower_email: String,
    pub fine_id: Option<DbId>,
    pub fine_amount: Option<Decimal>,
    pub fine_is_paid: Option<bool>,
}

/// Filter for `BorrowRepo::list`.
#[derive(Debug, Default, Clone)]
pub struct BorrowListFilter {
    /// Restrict to one borrower (self-service callers).
    pub user_id: Option<DbId>,
    /// Case-insensitive match on book title/author and borrower name/email/university id.
    pub search: Option<String>,
    pub status: Option<BorrowFilter>,
    pub limit: i64,
    pub offset: i64,
}

/// Borrow counts shown above listings and on dashboards.
#[derive(Debug, Clone, Default, FromRow, Serialize, PartialEq, Eq)]
pub struct BorrowStats {
    pub total: i64,
    pub active: i64,
    pub overdue: i64,
    pub returned: i64,
}
