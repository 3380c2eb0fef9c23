//! Fine rules: the flat overdue amount and the paid/unpaid state.

use rust_decimal::Decimal;
use serde::Serialize;

/// Flat fine charged once per overdue borrow, in cents.
pub const OVERDUE_FINE_CENTS: i64 = 5_000;

/// The flat overdue fine as a two-decimal amount (50.00).
pub fn overdue_fine_amount() -> Decimal {
    Decimal::new(OVERDUE_FINE_CENTS, 2)
}

/// `Unpaid -> Paid`; `Paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FineStatus {
    Unpaid,
    Paid,
}

impl FineStatus {
    pub fn from_flag(is_paid: bool) -> Self {
        if is_paid {
            Self::Paid
        } else {
            Self::Unpaid
        }
    }
}

/// Render an amount the way user-facing messages show it (`$50.00`).
pub fn format_amount(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_fine_is_fifty() {
        assert_eq!(overdue_fine_amount(), Decimal::from(50));
        assert_eq!(overdue_fine_amount().scale(), 2);
    }

    #[test]
    fn amounts_render_with_two_decimals() {
        assert_eq!(format_amount(overdue_fine_amount()), "$50.00");
        assert_eq!(format_amount(Decimal::new(75, 1)), "$7.50");
    }

    #[test]
    fn status_from_flag() {
        assert_eq!(FineStatus::from_flag(true), FineStatus::Paid);
        assert_eq!(FineStatus::from_flag(false), FineStatus::Unpaid);
    }
}
