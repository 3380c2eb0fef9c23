//! Repository for the `books` table.

use sqlx::{PgConnection, PgPool};
use unilib_core::catalog::{Availability, BookSort, CopyCounts};
use unilib_core::types::DbId;

use crate::models::book::{Book, BookFilter, BookListItem, CreateBook, UpdateBook};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, author, isbn, publisher, category_id, publication_date, \
    description, total_copies, available_copies, created_at, updated_at";

/// Same columns qualified with the `b.` alias for joined queries.
const B_COLUMNS: &str = "b.id, b.title, b.author, b.isbn, b.publisher, b.category_id, \
    b.publication_date, b.description, b.total_copies, b.available_copies, \
    b.created_at, b.updated_at";

/// Provides CRUD and copy-count operations for books.
pub struct BookRepo;

impl BookRepo {
    /// Insert a new book with the given (already validated) copy counts.
    pub async fn create(
        pool: &PgPool,
        input: &CreateBook,
        counts: CopyCounts,
    ) -> Result<Book, sqlx::Error> {
        let query = format!(
            "INSERT INTO books \
                (title, author, isbn, publisher, category_id, publication_date, description, \
                 total_copies, available_copies) \
             VALUES ($1, $2, $3, COALESCE($4, ''), $5, $6, COALESCE($7, ''), $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(&input.title)
            .bind(&input.author)
            .bind(input.isbn.trim())
            .bind(&input.publisher)
            .bind(input.category_id)
            .bind(input.publication_date)
            .bind(&input.description)
            .bind(counts.total)
            .bind(counts.available)
            .fetch_one(pool)
            .await
    }

    /// Find a book by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Book>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM books WHERE id = $1");
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a book inside an open transaction, without locking it.
    pub async fn find_by_id_tx(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Book>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM books WHERE id = $1");
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Fetch a book and lock its row until the surrounding transaction ends.
    ///
    /// Serializes concurrent issue/return on the same book so copy counts
    /// are never computed from a stale read.
    pub async fn lock_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<Book>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM books WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Write a new available-copies count.
    pub async fn set_available(
        conn: &mut PgConnection,
        id: DbId,
        available: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE books SET available_copies = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(available)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Update a book. Only non-`None` fields are applied.
    ///
    /// Copy counts in `input` must already be reconciled via
    /// [`CopyCounts::update`]. Returns `None` if the book does not exist.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateBook,
    ) -> Result<Option<Book>, sqlx::Error> {
        let query = format!(
            "UPDATE books SET \
                title = COALESCE($2, title), \
                author = COALESCE($3, author), \
                isbn = COALESCE($4, isbn), \
                publisher = COALESCE($5, publisher), \
                category_id = COALESCE($6, category_id), \
                publication_date = COALESCE($7, publication_date), \
                description = COALESCE($8, description), \
                total_copies = COALESCE($9, total_copies), \
                available_copies = COALESCE($10, available_copies), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.author)
            .bind(input.isbn.as_deref().map(str::trim))
            .bind(&input.publisher)
            .bind(input.category_id)
            .bind(input.publication_date)
            .bind(&input.description)
            .bind(input.total_copies)
            .bind(input.available_copies)
            .fetch_optional(conn)
            .await
    }

    /// Delete a book together with its borrows, fines and reservations.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List books matching `filter`, enriched with category name and borrow count.
    pub async fn list(pool: &PgPool, filter: &BookFilter) -> Result<Vec<BookListItem>, sqlx::Error> {
        let order_by = match filter.sort {
            BookSort::Title => "b.title ASC, b.id",
            BookSort::TitleDesc => "b.title DESC, b.id",
            BookSort::Newest => "b.created_at DESC, b.id DESC",
            BookSort::Popular => "borrow_count DESC, b.title",
        };
        let availability = match filter.availability {
            Some(Availability::Available) => "AND b.available_copies > 0",
            Some(Availability::Unavailable) => "AND b.available_copies = 0",
            None => "",
        };
        let query = format!(
            "SELECT {B_COLUMNS}, c.name AS category_name, \
                (SELECT COUNT(*) FROM borrows br WHERE br.book_id = b.id) AS borrow_count \
             FROM books b \
             LEFT JOIN categories c ON c.id = b.category_id \
             WHERE ($1::TEXT IS NULL \
                    OR b.title ILIKE '%' || $1 || '%' \
                    OR b.author ILIKE '%' || $1 || '%' \
                    OR b.isbn ILIKE '%' || $1 || '%') \
               AND ($2::BIGINT IS NULL OR b.category_id = $2) \
               {availability} \
             ORDER BY {order_by} \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, BookListItem>(&query)
            .bind(&filter.search)
            .bind(filter.category_id)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// All books in a category, alphabetically.
    pub async fn list_by_category(
        pool: &PgPool,
        category_id: DbId,
    ) -> Result<Vec<Book>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM books WHERE category_id = $1 ORDER BY title");
        sqlx::query_as::<_, Book>(&query)
            .bind(category_id)
            .fetch_all(pool)
            .await
    }

    /// IDs of books the user currently holds (unreturned borrows).
    pub async fn borrowed_ids_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT book_id FROM borrows WHERE user_id = $1 AND is_returned = false",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
