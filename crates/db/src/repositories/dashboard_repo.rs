//! Aggregate queries backing the dashboards.

use sqlx::PgPool;

use crate::models::dashboard::{LibraryTotals, PopularBook};

/// Read-only dashboard aggregates.
pub struct DashboardRepo;

impl DashboardRepo {
    /// Library-wide counters in one round trip.
    pub async fn library_totals(pool: &PgPool) -> Result<LibraryTotals, sqlx::Error> {
        sqlx::query_as::<_, LibraryTotals>(
            "SELECT
                (SELECT COUNT(*) FROM books) AS total_books,
                (SELECT COUNT(*) FROM borrows) AS total_borrows,
                (SELECT COUNT(*) FROM borrows WHERE NOT is_returned) AS active_borrows,
                (SELECT COALESCE(SUM(amount), 0) FROM fines) AS total_fines,
                (SELECT COUNT(*) FROM reservations) AS total_reservations,
                (SELECT COUNT(*) FROM reservations WHERE status = 'PENDING')
                    AS pending_reservations",
        )
        .fetch_one(pool)
        .await
    }

    /// Books ranked by total number of borrows.
    pub async fn popular_books(pool: &PgPool, limit: i64) -> Result<Vec<PopularBook>, sqlx::Error> {
        sqlx::query_as::<_, PopularBook>(
            "SELECT b.id, b.title, b.author, COUNT(br.id) AS borrow_count
             FROM books b
             LEFT JOIN borrows br ON br.book_id = b.id
             GROUP BY b.id
             ORDER BY borrow_count DESC, b.title
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
