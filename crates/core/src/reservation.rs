//! Reservation status machine.
//!
//! ```text
//! PENDING ──promote──▶ AVAILABLE ──▶ COMPLETED (no inbound transition)
//!    │                     │
//!    └──────cancel─────────┴──────▶ CANCELLED
//! ```
//!
//! `COMPLETED` is a valid stored value but nothing in the workspace moves a
//! reservation into it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_AVAILABLE: &str = "AVAILABLE";
pub const STATUS_CANCELLED: &str = "CANCELLED";
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// Message returned when cancelling a terminal reservation.
pub const NOT_CANCELLABLE: &str = "This reservation cannot be cancelled.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Available,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 4] = [
        ReservationStatus::Pending,
        ReservationStatus::Available,
        ReservationStatus::Completed,
        ReservationStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::Available => STATUS_AVAILABLE,
            Self::Cancelled => STATUS_CANCELLED,
            Self::Completed => STATUS_COMPLETED,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// Whether the lifecycle engine defines a transition `self -> next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Available)
                | (Self::Pending, Self::Cancelled)
                | (Self::Available, Self::Cancelled)
        )
    }

    /// Guard for cancellation.
    pub fn ensure_cancellable(self) -> Result<(), CoreError> {
        if self.can_transition_to(Self::Cancelled) {
            Ok(())
        } else {
            Err(CoreError::Validation(NOT_CANCELLABLE.to_string()))
        }
    }

    /// Sort rank used by the personal dashboard (pending first).
    pub fn dashboard_rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Available => 1,
            Self::Completed => 2,
            Self::Cancelled => 3,
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_PENDING => Ok(Self::Pending),
            STATUS_AVAILABLE => Ok(Self::Available),
            STATUS_CANCELLED => Ok(Self::Cancelled),
            STATUS_COMPLETED => Ok(Self::Completed),
            other => Err(CoreError::Validation(format!(
                "Invalid reservation status '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn pending_can_be_promoted_or_cancelled() {
        assert!(ReservationStatus::Pending.can_transition_to(ReservationStatus::Available));
        assert!(ReservationStatus::Pending.can_transition_to(ReservationStatus::Cancelled));
    }

    #[test]
    fn available_can_only_be_cancelled() {
        assert!(ReservationStatus::Available.can_transition_to(ReservationStatus::Cancelled));
        assert!(!ReservationStatus::Available.can_transition_to(ReservationStatus::Pending));
    }

    #[test]
    fn terminal_states_reject_cancellation() {
        for status in [ReservationStatus::Cancelled, ReservationStatus::Completed] {
            assert!(status.is_terminal());
            assert_matches!(
                status.ensure_cancellable(),
                Err(CoreError::Validation(msg)) if msg == NOT_CANCELLABLE
            );
        }
    }

    /// COMPLETED is stored but unreachable: no status transitions into it.
    /// If a collaborator starts completing reservations (e.g. when the
    /// reserved copy is borrowed), this test must be revisited.
    #[test]
    fn completed_status_has_no_inbound_transition() {
        for from in ReservationStatus::ALL {
            assert!(
                !from.can_transition_to(ReservationStatus::Completed),
                "unexpected transition {from} -> COMPLETED"
            );
        }
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in ReservationStatus::ALL {
            assert_eq!(status.as_str().parse::<ReservationStatus>().unwrap(), status);
        }
        assert!("pending".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn dashboard_rank_puts_pending_first() {
        let mut statuses = ReservationStatus::ALL.to_vec();
        statuses.reverse();
        statuses.sort_by_key(|s| s.dashboard_rank());
        assert_eq!(statuses[0], ReservationStatus::Pending);
        assert_eq!(statuses[3], ReservationStatus::Cancelled);
    }
}
