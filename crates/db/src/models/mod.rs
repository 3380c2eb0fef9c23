//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//!
//! Joined read models (`...Detail`) carry the extra columns listings need.

pub mod book;
pub mod borrow;
pub mod category;
pub mod dashboard;
pub mod fine;
pub mod notification;
pub mod reservation;
pub mod user;
