//! Repository for the `fines` table.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use unilib_core::types::DbId;

use crate::models::fine::{Fine, FineDetail, FineTotals};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, borrow_id, amount, is_paid, created_at, paid_at";

const DETAIL_SELECT: &str = "\
    SELECT f.id, f.user_id, f.borrow_id, f.amount, f.is_paid, f.created_at, f.paid_at, \
           br.book_id, b.title AS book_title, \
           COALESCE(NULLIF(TRIM(u.first_name || ' ' || u.last_name), ''), u.username) \
               AS user_name, \
           br.due_date, br.is_returned \
    FROM fines f \
    JOIN borrows br ON br.id = f.borrow_id \
    JOIN books b ON b.id = br.book_id \
    JOIN users u ON u.id = f.user_id";

/// Provides persistence for fines.
pub struct FineRepo;

impl FineRepo {
    /// Create the fine for `borrow_id` unless one already exists.
    ///
    /// Returns `Some` only when this call inserted the row. Concurrent
    /// callers race on `uq_fines_borrow`; the loser gets `None`.
    pub async fn create_if_absent(
        conn: &mut PgConnection,
        borrow_id: DbId,
        user_id: DbId,
        amount: Decimal,
    ) -> Result<Option<Fine>, sqlx::Error> {
        let query = format!(
            "INSERT INTO fines (borrow_id, user_id, amount)
             VALUES ($1, $2, $3)
             ON CONFLICT (borrow_id) DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Fine>(&query)
            .bind(borrow_id)
            .bind(user_id)
            .bind(amount)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Fine>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM fines WHERE id = $1");
        sqlx::query_as::<_, Fine>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The fine attached to a borrow, if any.
    pub async fn find_by_borrow(
        conn: &mut PgConnection,
        borrow_id: DbId,
    ) -> Result<Option<Fine>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM fines WHERE borrow_id = $1");
        sqlx::query_as::<_, Fine>(&query)
            .bind(borrow_id)
            .fetch_optional(conn)
            .await
    }

    /// Fetch a fine and lock its row until the transaction ends.
    pub async fn lock_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<Fine>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM fines WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Fine>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Mark a fine paid now. Already-paid rows are left untouched.
    pub async fn mark_paid(conn: &mut PgConnection, id: DbId) -> Result<Fine, sqlx::Error> {
        let query = format!(
            "UPDATE fines SET is_paid = true, paid_at = COALESCE(paid_at, NOW())
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Fine>(&query)
            .bind(id)
            .fetch_one(conn)
            .await
    }

    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<FineDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE f.id = $1");
        sqlx::query_as::<_, FineDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fines for one user, or all fines when `user_id` is `None`.
    /// Unpaid first, then newest.
    pub async fn list(
        pool: &PgPool,
        user_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FineDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT} WHERE ($1::BIGINT IS NULL OR f.user_id = $1) \
             ORDER BY f.is_paid, f.created_at DESC, f.id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, FineDetail>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Sums of unpaid and paid amounts.
    pub async fn totals(pool: &PgPool, user_id: Option<DbId>) -> Result<FineTotals, sqlx::Error> {
        sqlx::query_as::<_, FineTotals>(
            "SELECT
                COALESCE(SUM(amount) FILTER (WHERE NOT is_paid), 0) AS total_pending,
                COALESCE(SUM(amount) FILTER (WHERE is_paid), 0) AS total_paid
             FROM fines
             WHERE ($1::BIGINT IS NULL OR user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
