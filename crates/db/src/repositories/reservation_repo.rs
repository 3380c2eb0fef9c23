//! Repository for the `reservations` table.

use sqlx::{PgConnection, PgPool};
use unilib_core::reservation::{
    ReservationStatus, STATUS_AVAILABLE, STATUS_CANCELLED, STATUS_PENDING,
};
use unilib_core::types::DbId;

use crate::models::reservation::{Reservation, ReservationCounts, ReservationDetail};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, book_id, status, reservation_date, notified_at, cancelled_at";

const DETAIL_SELECT: &str = "\
    SELECT r.id, r.user_id, r.book_id, r.status, r.reservation_date, r.notified_at, \
           r.cancelled_at, b.title AS book_title, \
           COALESCE(NULLIF(TRIM(u.first_name || ' ' || u.last_name), ''), u.username) \
               AS user_name \
    FROM reservations r \
    JOIN books b ON b.id = r.book_id \
    JOIN users u ON u.id = r.user_id";

/// Provides persistence for reservations.
pub struct ReservationRepo;

impl ReservationRepo {
    /// Insert a PENDING reservation.
    pub async fn create(
        conn: &mut PgConnection,
        user_id: DbId,
        book_id: DbId,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "INSERT INTO reservations (user_id, book_id, status)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(user_id)
            .bind(book_id)
            .bind(STATUS_PENDING)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE id = $1");
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a reservation and lock its row until the transaction ends.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Oldest PENDING reservation for a book (FIFO by reservation date,
    /// ties broken by id), locked for promotion.
    pub async fn next_pending_for_book(
        conn: &mut PgConnection,
        book_id: DbId,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reservations
             WHERE book_id = $1 AND status = $2
             ORDER BY reservation_date, id
             LIMIT 1
             FOR UPDATE"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(book_id)
            .bind(STATUS_PENDING)
            .fetch_optional(conn)
            .await
    }

    /// PENDING -> AVAILABLE, stamping `notified_at`.
    pub async fn mark_available(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "UPDATE reservations SET status = $2, notified_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .bind(STATUS_AVAILABLE)
            .fetch_one(conn)
            .await
    }

    /// Move to CANCELLED, stamping `cancelled_at`.
    pub async fn mark_cancelled(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "UPDATE reservations SET status = $2, cancelled_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .bind(STATUS_CANCELLED)
            .fetch_one(conn)
            .await
    }

    /// Reservations for one user (or everyone), optionally by status, newest first.
    pub async fn list(
        pool: &PgPool,
        user_id: Option<DbId>,
        status: Option<ReservationStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReservationDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT} \
             WHERE ($1::BIGINT IS NULL OR r.user_id = $1) \
               AND ($2::TEXT IS NULL OR r.status = $2) \
             ORDER BY r.reservation_date DESC, r.id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, ReservationDetail>(&query)
            .bind(user_id)
            .bind(status.map(ReservationStatus::as_str))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// A user's reservations in dashboard order: PENDING, AVAILABLE,
    /// COMPLETED, CANCELLED, each newest first.
    pub async fn list_for_dashboard(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<ReservationDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT} WHERE r.user_id = $1 \
             ORDER BY CASE r.status \
                        WHEN 'PENDING' THEN 0 \
                        WHEN 'AVAILABLE' THEN 1 \
                        WHEN 'COMPLETED' THEN 2 \
                        ELSE 3 END, \
                      r.reservation_date DESC, r.id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, ReservationDetail>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Most recent reservations library-wide.
    pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<ReservationDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT} ORDER BY r.reservation_date DESC, r.id DESC LIMIT $1"
        );
        sqlx::query_as::<_, ReservationDetail>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Per-status counts for one user or everyone.
    pub async fn counts(
        pool: &PgPool,
        user_id: Option<DbId>,
    ) -> Result<ReservationCounts, sqlx::Error> {
        sqlx::query_as::<_, ReservationCounts>(
            "SELECT
                COUNT(*) FILTER (WHERE status = 'PENDING') AS pending,
                COUNT(*) FILTER (WHERE status = 'AVAILABLE') AS available,
                COUNT(*) FILTER (WHERE status = 'COMPLETED') AS completed,
                COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled
             FROM reservations
             WHERE ($1::BIGINT IS NULL OR user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
