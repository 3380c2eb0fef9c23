//! Notification kinds.
//!
//! Codes must match the `notifications.notification_type` CHECK constraint.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationType {
    #[serde(rename = "DUE")]
    DueDate,
    #[serde(rename = "RES")]
    Reservation,
    #[serde(rename = "FINE")]
    Fine,
    #[serde(rename = "GEN")]
    General,
    #[serde(rename = "BORROW")]
    Borrowed,
    #[serde(rename = "RETURN")]
    Returned,
    #[serde(rename = "RES_CANCEL")]
    ReservationCancelled,
}

impl NotificationType {
    /// Stored code.
    pub fn code(self) -> &'static str {
        match self {
            Self::DueDate => "DUE",
            Self::Reservation => "RES",
            Self::Fine => "FINE",
            Self::General => "GEN",
            Self::Borrowed => "BORROW",
            Self::Returned => "RETURN",
            Self::ReservationCancelled => "RES_CANCEL",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::DueDate => "Due Date Reminder",
            Self::Reservation => "Reservation Available",
            Self::Fine => "Fine Issued",
            Self::General => "General Notification",
            Self::Borrowed => "Borrowed Book",
            Self::Returned => "Returned Book",
            Self::ReservationCancelled => "Reservation Cancelled",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for NotificationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DUE" => Ok(Self::DueDate),
            "RES" => Ok(Self::Reservation),
            "FINE" => Ok(Self::Fine),
            "GEN" => Ok(Self::General),
            "BORROW" => Ok(Self::Borrowed),
            "RETURN" => Ok(Self::Returned),
            "RES_CANCEL" => Ok(Self::ReservationCancelled),
            other => Err(CoreError::Validation(format!(
                "Invalid notification type '{other}'"
            ))),
        }
    }
}
