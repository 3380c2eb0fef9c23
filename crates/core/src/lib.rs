//! Domain rules for the UniLib library backend.
//!
//! Everything here is pure: no I/O, no database. The DB, lifecycle and API
//! crates lean on these types and predicates so the rules exist once.

pub mod borrow;
pub mod catalog;
pub mod error;
pub mod fine;
pub mod notification;
pub mod reservation;
pub mod roles;
pub mod types;
