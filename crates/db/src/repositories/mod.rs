//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Reads take `&PgPool`; methods that participate in a lifecycle
//! transaction take `&mut PgConnection` so callers can pass `&mut *tx`.

pub mod book_repo;
pub mod borrow_repo;
pub mod category_repo;
pub mod dashboard_repo;
pub mod fine_repo;
pub mod notification_repo;
pub mod reservation_repo;
pub mod user_repo;

pub use book_repo::BookRepo;
pub use borrow_repo::BorrowRepo;
pub use category_repo::CategoryRepo;
pub use dashboard_repo::DashboardRepo;
pub use fine_repo::FineRepo;
pub use notification_repo::NotificationRepo;
pub use reservation_repo::ReservationRepo;
pub use user_repo::UserRepo;
