//! Catalog rules: copy-count bookkeeping and book field validation.
//!
//! The invariant `0 <= available <= total` is maintained here in pure code
//! and backed in the database by the `ck_books_copy_counts` CHECK constraint.

use serde::Serialize;

use crate::error::CoreError;

/// Maximum ISBN length (ISBN-13 without separators).
pub const MAX_ISBN_LENGTH: usize = 13;

/// Maximum title length.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum author length.
pub const MAX_AUTHOR_LENGTH: usize = 100;

/// Total and available copy counts of one book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CopyCounts {
    pub total: i32,
    pub available: i32,
}

impl CopyCounts {
    /// Counts for a freshly created book: every copy is on the shelf.
    pub fn new_book(total: i32) -> Result<Self, CoreError> {
        validate_total_copies(total)?;
        Ok(Self {
            total,
            available: total,
        })
    }

    /// Take one copy off the shelf.
    ///
    /// Fails with [`CoreError::Conflict`] when no copy is available.
    pub fn checkout(self) -> Result<Self, CoreError> {
        if self.available <= 0 {
            return Err(CoreError::Conflict(
                "No copies of this book are currently available".to_string(),
            ));
        }
        Ok(Self {
            available: self.available - 1,
            ..self
        })
    }

    /// Put one copy back on the shelf, never exceeding the total.
    pub fn checkin(self) -> Self {
        Self {
            available: (self.available + 1).min(self.total),
            ..self
        }
    }

    /// Apply an edit of the total (and optionally the available) count.
    ///
    /// An explicit `available` above `total` is rejected; otherwise the
    /// available count is clamped down to the new total.
    pub fn update(self, total: Option<i32>, available: Option<i32>) -> Result<Self, CoreError> {
        let total = total.unwrap_or(self.total);
        validate_total_copies(total)?;

        if let Some(available) = available {
            if available < 0 {
                return Err(CoreError::Validation(
                    "Available copies cannot be negative".to_string(),
                ));
            }
            if available > total {
                return Err(CoreError::Validation(
                    "Available copies cannot exceed total copies".to_string(),
                ));
            }
            return Ok(Self { total, available });
        }

        Ok(Self {
            total,
            available: self.available.min(total),
        })
    }

    pub fn is_available(&self) -> bool {
        self.available > 0
    }
}

fn validate_total_copies(total: i32) -> Result<(), CoreError> {
    if total < 0 {
        return Err(CoreError::Validation(
            "Total copies cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Validate an ISBN: non-empty, at most 13 characters, digits plus an
/// optional trailing `X` (ISBN-10 check digit).
pub fn validate_isbn(isbn: &str) -> Result<(), CoreError> {
    let isbn = isbn.trim();
    if isbn.is_empty() {
        return Err(CoreError::Validation("ISBN must not be empty".to_string()));
    }
    if isbn.len() > MAX_ISBN_LENGTH {
        return Err(CoreError::Validation(format!(
            "ISBN '{isbn}' exceeds {MAX_ISBN_LENGTH} characters"
        )));
    }
    if !isbn.is_ascii() {
        return Err(CoreError::Validation(format!(
            "ISBN '{isbn}' must contain only digits"
        )));
    }
    let (body, last) = isbn.split_at(isbn.len() - 1);
    let body_ok = body.chars().all(|c| c.is_ascii_digit());
    let last_ok = last
        .chars()
        .all(|c| c.is_ascii_digit() || c == 'X' || c == 'x');
    if !body_ok || !last_ok {
        return Err(CoreError::Validation(format!(
            "ISBN '{isbn}' must contain only digits"
        )));
    }
    Ok(())
}

/// Require a non-blank value of at most `max` characters.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(CoreError::Validation(format!(
            "{field} exceeds {max} characters"
        )));
    }
    Ok(())
}

/// Availability filter for book listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    /// Parse the `availability` query value; anything else means "no filter".
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(Self::Available),
            "unavailable" => Some(Self::Unavailable),
            _ => None,
        }
    }
}

/// Sort orders accepted by the book listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSort {
    Title,
    TitleDesc,
    #[default]
    Newest,
    Popular,
}

impl BookSort {
    /// Parse the `sort` query value, falling back to newest first.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("title") => Self::Title,
            Some("-title") => Self::TitleDesc,
            Some("popular") => Self::Popular,
            _ => Self::Newest,
        }
    }
}
