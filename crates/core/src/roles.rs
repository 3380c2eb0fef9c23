//! User roles and the centralized permission table.
//!
//! Role names must match the `users.role` CHECK constraint in
//! `20261001000001_create_users_table.sql`. Every permission decision in the
//! workspace goes through [`permits`] (or the ownership-aware helpers built on
//! it) so the rules live in exactly one place.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_LIBRARIAN: &str = "LIBRARIAN";
pub const ROLE_STUDENT: &str = "STUDENT";
pub const ROLE_FACULTY: &str = "FACULTY";

/// The role a user holds. Stored as upper-case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Librarian,
    Student,
    Faculty,
}

impl Role {
    /// Roles counted as library staff.
    pub const STAFF: [Role; 2] = [Role::Admin, Role::Librarian];

    /// Roles that borrow and reserve for themselves.
    pub const SELF_SERVICE: [Role; 2] = [Role::Student, Role::Faculty];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Librarian => ROLE_LIBRARIAN,
            Role::Student => ROLE_STUDENT,
            Role::Faculty => ROLE_FACULTY,
        }
    }

    /// Admins and librarians.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Librarian)
    }

    /// Students and faculty.
    pub fn is_self_service(self) -> bool {
        !self.is_staff()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_LIBRARIAN => Ok(Role::Librarian),
            ROLE_STUDENT => Ok(Role::Student),
            ROLE_FACULTY => Ok(Role::Faculty),
            other => Err(CoreError::Validation(format!(
                "Invalid role '{other}'. Must be one of: {ROLE_ADMIN}, {ROLE_LIBRARIAN}, \
                 {ROLE_STUDENT}, {ROLE_FACULTY}"
            ))),
        }
    }
}

/// Something a user may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create, update or delete books and categories.
    ManageCatalog,
    /// List, create, update and deactivate user accounts.
    ManageUsers,
    /// Issue a book to a user other than oneself, with a custom due date.
    IssueForOthers,
    /// Borrow a book for oneself.
    BorrowForSelf,
    /// Return a borrow held by someone else.
    ReturnAnyBorrow,
    /// Mark a fine as paid (in-person payment).
    PayFine,
    /// Reserve a book on behalf of another user.
    ReserveForOthers,
    /// Cancel a reservation owned by someone else.
    CancelAnyReservation,
    /// See borrows, fines and reservations of every user.
    ViewAllRecords,
}

/// Central permission table: does `role` allow `action`?
pub fn permits(role: Role, action: Action) -> bool {
    match action {
        Action::ManageUsers => role == Role::Admin,
        Action::BorrowForSelf => true,
        Action::ManageCatalog
        | Action::IssueForOthers
        | Action::ReturnAnyBorrow
        | Action::PayFine
        | Action::ReserveForOthers
        | Action::CancelAnyReservation
        | Action::ViewAllRecords => role.is_staff(),
    }
}

/// Like [`permits`], but maps a refusal to [`CoreError::Forbidden`].
pub fn require(role: Role, action: Action, message: &str) -> Result<(), CoreError> {
    if permits(role, action) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(message.to_string()))
    }
}

/// An actor may return a borrow if they hold it or are staff.
pub fn can_return(actor_id: DbId, actor_role: Role, borrower_id: DbId) -> bool {
    actor_id == borrower_id || permits(actor_role, Action::ReturnAnyBorrow)
}

/// An actor may cancel a reservation if they own it or are staff.
pub fn can_cancel(actor_id: DbId, actor_role: Role, owner_id: DbId) -> bool {
    actor_id == owner_id || permits(actor_role, Action::CancelAnyReservation)
}

/// An actor may see another user's records only if they are staff.
pub fn can_view(actor_id: DbId, actor_role: Role, owner_id: DbId) -> bool {
    actor_id == owner_id || permits(actor_role, Action::ViewAllRecords)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn role_round_trips_through_its_text_form() {
        for role in [Role::Admin, Role::Librarian, Role::Student, Role::Faculty] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_a_validation_error() {
        assert_matches!("superuser".parse::<Role>(), Err(CoreError::Validation(_)));
        assert_matches!("admin".parse::<Role>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn staff_and_self_service_partition_the_roles() {
        for role in Role::STAFF {
            assert!(role.is_staff());
            assert!(!role.is_self_service());
        }
        for role in Role::SELF_SERVICE {
            assert!(role.is_self_service());
        }
    }

    #[test]
    fn only_staff_pay_fines_and_manage_catalog() {
        assert!(permits(Role::Librarian, Action::PayFine));
        assert!(permits(Role::Admin, Action::ManageCatalog));
        assert!(!permits(Role::Student, Action::PayFine));
        assert!(!permits(Role::Faculty, Action::ManageCatalog));
    }

    #[test]
    fn only_admin_manages_users() {
        assert!(permits(Role::Admin, Action::ManageUsers));
        assert!(!permits(Role::Librarian, Action::ManageUsers));
    }

    #[test]
    fn everyone_may_borrow_for_self() {
        assert!(permits(Role::Student, Action::BorrowForSelf));
        assert!(permits(Role::Admin, Action::BorrowForSelf));
    }

    #[test]
    fn owner_or_staff_may_cancel() {
        assert!(can_cancel(7, Role::Student, 7));
        assert!(!can_cancel(7, Role::Student, 8));
        assert!(can_cancel(1, Role::Librarian, 8));
    }

    #[test]
    fn owner_or_staff_may_return() {
        assert!(can_return(3, Role::Faculty, 3));
        assert!(!can_return(3, Role::Faculty, 4));
        assert!(can_return(9, Role::Admin, 4));
    }

    #[test]
    fn require_maps_refusal_to_forbidden() {
        assert!(require(Role::Admin, Action::PayFine, "nope").is_ok());
        assert_matches!(
            require(Role::Student, Action::PayFine, "Only staff can mark fines as paid"),
            Err(CoreError::Forbidden(msg)) if msg.contains("staff")
        );
    }
}
