//! Repository for the `borrows` table.

use sqlx::{PgConnection, PgPool};
use unilib_core::borrow::BorrowFilter;
use unilib_core::types::{Date, DbId};

use crate::models::borrow::{Borrow, BorrowDetail, BorrowListFilter, BorrowStats, CreateBorrow};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, book_id, issued_by, issue_date, due_date, return_date, is_returned, created_at";

/// Joined select for [`BorrowDetail`]; callers append `WHERE` / `ORDER BY`.
const DETAIL_SELECT: &str = "\
    SELECT br.id, br.user_id, br.book_id, br.issued_by, br.issue_date, br.due_date, \
           br.return_date, br.is_returned, br.created_at, \
           b.title AS book_title, b.author AS book_author, \
           COALESCE(NULLIF(TRIM(u.first_name || ' ' || u.last_name), ''), u.username) \
               AS borrower_name, \
           u.email AS borrower_email, \
           f.id AS fine_id, f.amount AS fine_amount, f.is_paid AS fine_is_paid \
    FROM borrows br \
    JOIN books b ON b.id = br.book_id \
    JOIN users u ON u.id = br.user_id \
    LEFT JOIN fines f ON f.borrow_id = br.id";

/// Provides persistence for borrow records.
pub struct BorrowRepo;

impl BorrowRepo {
    /// Insert a new (unreturned) borrow inside the caller's transaction.
    pub async fn insert(conn: &mut PgConnection, input: &CreateBorrow) -> Result<Borrow, sqlx::Error> {
        let query = format!(
            "INSERT INTO borrows (user_id, book_id, issued_by, issue_date, due_date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Borrow>(&query)
            .bind(input.user_id)
            .bind(input.book_id)
            .bind(input.issued_by)
            .bind(input.issue_date)
            .bind(input.due_date)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Borrow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM borrows WHERE id = $1");
        sqlx::query_as::<_, Borrow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a borrow and lock its row until the transaction ends.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Borrow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM borrows WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Borrow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Whether `user_id` holds an unreturned borrow of `book_id`.
    pub async fn has_active(
        conn: &mut PgConnection,
        user_id: DbId,
        book_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM borrows
                WHERE user_id = $1 AND book_id = $2 AND is_returned = false
             )",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(conn)
        .await
    }

    /// Mark a borrow returned on `return_date`.
    pub async fn mark_returned(
        conn: &mut PgConnection,
        id: DbId,
        return_date: Date,
    ) -> Result<Borrow, sqlx::Error> {
        let query = format!(
            "UPDATE borrows SET is_returned = true, return_date = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Borrow>(&query)
            .bind(id)
            .bind(return_date)
            .fetch_one(conn)
            .await
    }

    /// One borrow with its book, borrower and fine.
    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<BorrowDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE br.id = $1");
        sqlx::query_as::<_, BorrowDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List borrows matching `filter`, newest issue date first.
    ///
    /// `today` decides which unreturned borrows count as overdue.
    pub async fn list(
        pool: &PgPool,
        filter: &BorrowListFilter,
        today: Date,
    ) -> Result<Vec<BorrowDetail>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if filter.user_id.is_some() {
            conditions.push(format!("br.user_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if filter.search.is_some() {
            let p = format!("'%' || ${bind_idx} || '%'");
            conditions.push(format!(
                "(b.title ILIKE {p} OR b.author ILIKE {p} OR u.first_name ILIKE {p} \
                  OR u.last_name ILIKE {p} OR u.email ILIKE {p} OR u.university_id ILIKE {p})"
            ));
            bind_idx += 1;
        }
        match filter.status {
            Some(BorrowFilter::Active) => conditions.push("br.is_returned = false".to_string()),
            Some(BorrowFilter::Returned) => conditions.push("br.is_returned = true".to_string()),
            Some(BorrowFilter::Overdue) => {
                conditions.push(format!("br.is_returned = false AND br.due_date < ${bind_idx}"));
                bind_idx += 1;
            }
            None => {}
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let query = format!(
            "{DETAIL_SELECT} {where_clause} \
             ORDER BY br.issue_date DESC, br.id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let mut q = sqlx::query_as::<_, BorrowDetail>(&query);
        if let Some(user_id) = filter.user_id {
            q = q.bind(user_id);
        }
        if let Some(ref search) = filter.search {
            q = q.bind(search.clone());
        }
        if filter.status == Some(BorrowFilter::Overdue) {
            q = q.bind(today);
        }
        q.bind(filter.limit).bind(filter.offset).fetch_all(pool).await
    }

    /// Total / active / overdue / returned counts, for one user or everyone.
    pub async fn stats(
        pool: &PgPool,
        user_id: Option<DbId>,
        today: Date,
    ) -> Result<BorrowStats, sqlx::Error> {
        sqlx::query_as::<_, BorrowStats>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE NOT is_returned) AS active,
                COUNT(*) FILTER (WHERE NOT is_returned AND due_date < $2) AS overdue,
                COUNT(*) FILTER (WHERE is_returned) AS returned
             FROM borrows
             WHERE ($1::BIGINT IS NULL OR user_id = $1)",
        )
        .bind(user_id)
        .bind(today)
        .fetch_one(pool)
        .await
    }

    /// Unreturned borrows past due on `today` that have no fine yet,
    /// oldest due date first.
    pub async fn list_overdue_without_fine(
        pool: &PgPool,
        today: Date,
    ) -> Result<Vec<Borrow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM borrows br
             WHERE br.is_returned = false
               AND br.due_date < $1
               AND NOT EXISTS (SELECT 1 FROM fines f WHERE f.borrow_id = br.id)
             ORDER BY br.due_date, br.id"
        );
        sqlx::query_as::<_, Borrow>(&query)
            .bind(today)
            .fetch_all(pool)
            .await
    }

    /// Most recently issued borrows.
    pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<BorrowDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} ORDER BY br.issue_date DESC, br.id DESC LIMIT $1");
        sqlx::query_as::<_, BorrowDetail>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Overdue borrows, most overdue first.
    pub async fn overdue(
        pool: &PgPool,
        today: Date,
        limit: i64,
    ) -> Result<Vec<BorrowDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT} WHERE br.is_returned = false AND br.due_date < $1 \
             ORDER BY br.due_date, br.id LIMIT $2"
        );
        sqlx::query_as::<_, BorrowDetail>(&query)
            .bind(today)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// A user's unreturned borrows, earliest due date first.
    pub async fn active_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<BorrowDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT} WHERE br.user_id = $1 AND br.is_returned = false \
             ORDER BY br.due_date, br.id"
        );
        sqlx::query_as::<_, BorrowDetail>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
