//! Book entity model, DTOs and listing filter.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unilib_core::catalog::{Availability, BookSort, CopyCounts};
use unilib_core::types::{Date, DbId, Timestamp};

/// A row from the `books` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Book {
    pub id: DbId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub category_id: Option<DbId>,
    pub publication_date: Option<Date>,
    pub description: String,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Book {
    pub fn copy_counts(&self) -> CopyCounts {
        CopyCounts {
            total: self.total_copies,
            available: self.available_copies,
        }
    }
}

/// A book row enriched for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub book: Book,
    pub category_name: Option<String>,
    pub borrow_count: i64,
}

/// DTO for creating a book. Available copies always start at `total_copies`.
#[derive(Debug, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: Option<String>,
    pub category_id: Option<DbId>,
    pub publication_date: Option<Date>,
    pub description: Option<String>,
    pub total_copies: i32,
}

/// DTO for updating a book. All fields are optional.
///
/// Copy counts are resolved through [`CopyCounts::update`] before reaching
/// the repository, so the repository writes them verbatim.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub category_id: Option<DbId>,
    pub publication_date: Option<Date>,
    pub description: Option<String>,
    pub total_copies: Option<i32>,
    pub available_copies: Option<i32>,
}

/// Filter for `BookRepo::list`.
#[derive(Debug, Default, Clone)]
pub struct BookFilter {
    /// Case-insensitive match against title, author and ISBN.
    pub search: Option<String>,
    pub category_id: Option<DbId>,
    pub availability: Option<Availability>,
    pub sort: BookSort,
    pub limit: i64,
    pub offset: i64,
}
