//! Borrow lifecycle rules: due dates, overdue detection, return guard.
//!
//! A borrow is `Active` until returned; `Returned` is terminal. Overdue is
//! computed from the due date and never stored.

use std::str::FromStr;

use chrono::Duration;
use serde::Serialize;

use crate::error::CoreError;
use crate::fine::FineStatus;
use crate::types::Date;

/// Loan period applied to self-service borrows and as the staff default.
pub const DEFAULT_LOAN_DAYS: i64 = 7;

/// Message returned when a borrow is returned twice.
pub const ALREADY_RETURNED: &str = "This book has already been returned";

/// Lifecycle state of a borrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowState {
    Active,
    Returned,
}

impl BorrowState {
    pub fn from_flag(is_returned: bool) -> Self {
        if is_returned {
            Self::Returned
        } else {
            Self::Active
        }
    }

    /// Guard for the `Active -> Returned` transition.
    pub fn ensure_returnable(self) -> Result<(), CoreError> {
        match self {
            Self::Active => Ok(()),
            Self::Returned => Err(CoreError::Validation(ALREADY_RETURNED.to_string())),
        }
    }
}

/// Due date for a borrow issued on `today` with the default loan period.
pub fn default_due_date(today: Date) -> Date {
    today + Duration::days(DEFAULT_LOAN_DAYS)
}

/// Reject due dates that already lie in the past.
pub fn validate_due_date(due_date: Date, today: Date) -> Result<(), CoreError> {
    if due_date < today {
        return Err(CoreError::Validation(format!(
            "Due date {due_date} is in the past"
        )));
    }
    Ok(())
}

/// A borrow is overdue when it is unreturned and today is past its due date.
pub fn is_overdue(is_returned: bool, due_date: Date, today: Date) -> bool {
    !is_returned && today > due_date
}

/// Whole days past the due date, or 0 when not overdue.
pub fn overdue_days(is_returned: bool, due_date: Date, today: Date) -> i64 {
    if is_overdue(is_returned, due_date, today) {
        (today - due_date).num_days()
    } else {
        0
    }
}

/// Confirmation shown after a return, worded by fine status and by whether
/// the borrower returned the book themselves.
pub fn return_message(fine: Option<FineStatus>, by_borrower: bool, borrower_name: &str) -> String {
    match (fine, by_borrower) {
        (None, _) => "Book returned successfully!".to_string(),
        (Some(FineStatus::Paid), true) => {
            "Your fine has been paid and book returned successfully!".to_string()
        }
        (Some(FineStatus::Paid), false) => format!(
            "User {borrower_name} has paid the fine and book returned successfully!"
        ),
        (Some(FineStatus::Unpaid), true) => {
            "Book returned successfully, but you haven't paid the fine yet!".to_string()
        }
        (Some(FineStatus::Unpaid), false) => format!(
            "Book returned successfully, but user {borrower_name} hasn't paid the fine yet!"
        ),
    }
}

/// Status filter accepted by the borrow listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowFilter {
    Active,
    Overdue,
    Returned,
}

impl FromStr for BorrowFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "overdue" => Ok(Self::Overdue),
            "returned" => Ok(Self::Returned),
            other => Err(CoreError::Validation(format!(
                "Invalid status filter '{other}'. Must be one of: active, overdue, returned"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_due_date_is_a_week_out() {
        assert_eq!(default_due_date(date(2026, 3, 28)), date(2026, 4, 4));
    }

    #[test]
    fn due_today_is_not_overdue() {
        let today = date(2026, 5, 1);
        assert!(!is_overdue(false, today, today));
        assert_eq!(overdue_days(false, today, today), 0);
    }

    #[test]
    fn due_yesterday_is_one_day_overdue() {
        let today = date(2026, 5, 1);
        let due = date(2026, 4, 30);
        assert!(is_overdue(false, due, today));
        assert_eq!(overdue_days(false, due, today), 1);
    }

    #[test]
    fn returned_borrow_is_never_overdue() {
        let today = date(2026, 5, 10);
        assert!(!is_overdue(true, date(2026, 1, 1), today));
        assert_eq!(overdue_days(true, date(2026, 1, 1), today), 0);
    }

    #[test]
    fn second_return_is_a_validation_error() {
        assert!(BorrowState::Active.ensure_returnable().is_ok());
        assert_matches!(
            BorrowState::Returned.ensure_returnable(),
            Err(CoreError::Validation(msg)) if msg == ALREADY_RETURNED
        );
    }

    #[test]
    fn past_due_dates_are_rejected() {
        let today = date(2026, 5, 1);
        assert!(validate_due_date(today, today).is_ok());
        assert!(validate_due_date(date(2026, 4, 30), today).is_err());
    }

    #[test]
    fn return_message_depends_on_fine_and_actor() {
        assert_eq!(return_message(None, true, "Sam"), "Book returned successfully!");
        assert_eq!(
            return_message(Some(FineStatus::Unpaid), true, "Sam"),
            "Book returned successfully, but you haven't paid the fine yet!"
        );
        assert_eq!(
            return_message(Some(FineStatus::Unpaid), false, "Sam Student"),
            "Book returned successfully, but user Sam Student hasn't paid the fine yet!"
        );
        assert!(return_message(Some(FineStatus::Paid), false, "Sam").starts_with("User Sam"));
    }

    #[test]
    fn filter_parsing() {
        assert_eq!("overdue".parse::<BorrowFilter>().unwrap(), BorrowFilter::Overdue);
        assert!("late".parse::<BorrowFilter>().is_err());
    }
}
