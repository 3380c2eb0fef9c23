//! Reservation entity model and listing types.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unilib_core::error::CoreError;
use unilib_core::reservation::ReservationStatus;
use unilib_core::types::{DbId, Timestamp};

/// A row from the `reservations` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    pub id: DbId,
    pub user_id: DbId,
    pub book_id: DbId,
    pub status: String,
    pub reservation_date: Timestamp,
    pub notified_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
}

impl Reservation {
    /// Parsed status. The CHECK constraint makes failure an internal error.
    pub fn status(&self) -> Result<ReservationStatus, CoreError> {
        self.status.parse().map_err(|_| {
            CoreError::Internal(format!("reservation {} has unknown status", self.id))
        })
    }
}

/// A reservation joined with its book and owner for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReservationDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub reservation: Reservation,
    pub book_title: String,
    pub user_name: String,
}

/// Reservation counts per status.
#[derive(Debug, Clone, Default, FromRow, Serialize, PartialEq, Eq)]
pub struct ReservationCounts {
    pub pending: i64,
    pub available: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl ReservationCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.available + self.completed + self.cancelled
    }

    /// Share of reservations still pending, rounded to a whole percent.
    pub fn pending_percentage(&self) -> i64 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        ((self.pending as f64 / total as f64) * 100.0).round() as i64
    }
}
