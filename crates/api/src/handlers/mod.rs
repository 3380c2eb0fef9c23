//! Request handlers, one module per resource.

pub mod auth;
pub mod books;
pub mod borrows;
pub mod categories;
pub mod dashboard;
pub mod fines;
pub mod notifications;
pub mod reservations;
pub mod users;

use unilib_core::types::Date;

/// The library's current calendar date.
pub(crate) fn today() -> Date {
    chrono::Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_follows_the_utc_calendar() {
        let before = chrono::Utc::now().date_naive();
        let day = today();
        let after = chrono::Utc::now().date_naive();
        assert!(day == before || day == after);
    }
}
