//! Fine lifecycle: lazy creation on overdue detection, payment, and the
//! overdue sweep.
//!
//! A borrow counts as processed once it has a fine; there is no separate
//! flag. Creation is `INSERT .. ON CONFLICT DO NOTHING`, so overlapping
//! sweeps never produce a second fine.

use serde::Serialize;
use unilib_core::error::CoreError;
use unilib_core::fine::overdue_fine_amount;
use unilib_core::roles::{self, Action};
use unilib_core::types::{Date, DbId};
use unilib_db::models::borrow::Borrow;
use unilib_db::models::fine::Fine;
use unilib_db::repositories::{BookRepo, BorrowRepo, FineRepo, UserRepo};
use unilib_events::{BookRef, LibraryEvent};

use crate::error::LifecycleResult;
use crate::{Actor, Lifecycle};

/// Outcome of one overdue sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Overdue borrows without a fine at the start of the sweep.
    pub examined: usize,
    pub fines_created: usize,
}

impl Lifecycle {
    /// Create the flat overdue fine for `borrow` if it is overdue on
    /// `today` and has no fine yet. Returns whether a fine was created.
    ///
    /// `borrow` may be stale: the row is locked and re-checked inside the
    /// transaction, so a return that committed in between wins.
    pub async fn check_and_create_fine(&self, borrow: &Borrow, today: Date) -> LifecycleResult<bool> {
        if !borrow.is_overdue(today) {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;

        let borrow = BorrowRepo::lock_by_id(&mut *tx, borrow.id)
            .await?
            .ok_or_else(|| CoreError::not_found("Borrow", borrow.id))?;
        if !borrow.is_overdue(today) {
            tx.rollback().await?;
            return Ok(false);
        }

        let Some(fine) =
            FineRepo::create_if_absent(&mut *tx, borrow.id, borrow.user_id, overdue_fine_amount())
                .await?
        else {
            tx.rollback().await?;
            return Ok(false);
        };

        let book = BookRepo::find_by_id_tx(&mut *tx, borrow.book_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Book", borrow.book_id))?;
        let borrower = UserRepo::contact_by_id(&mut *tx, borrow.user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", borrow.user_id))?;

        tx.commit().await?;

        let overdue_days = borrow.overdue_days(today);
        tracing::info!(
            fine_id = fine.id,
            borrow_id = borrow.id,
            user_id = borrow.user_id,
            overdue_days,
            "Overdue fine created"
        );
        self.bus.publish(LibraryEvent::FineCreated {
            fine,
            book: BookRef::from(&book),
            borrow,
            borrower,
            overdue_days,
        });

        Ok(true)
    }

    /// Look up a borrow by id and run [`check_and_create_fine`](Self::check_and_create_fine).
    pub async fn check_and_create_fine_by_id(
        &self,
        borrow_id: DbId,
        today: Date,
    ) -> LifecycleResult<bool> {
        let borrow = BorrowRepo::find_by_id(&self.pool, borrow_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Borrow", borrow_id))?;
        self.check_and_create_fine(&borrow, today).await
    }

    /// Mark a fine paid. Staff only; paying a paid fine changes nothing.
    pub async fn pay_fine(&self, actor: Actor, fine_id: DbId) -> LifecycleResult<Fine> {
        roles::require(
            actor.role,
            Action::PayFine,
            "Only library staff can record fine payments",
        )?;

        let mut tx = self.pool.begin().await?;

        let fine = FineRepo::lock_by_id(&mut *tx, fine_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Fine", fine_id))?;
        if fine.is_paid {
            tx.rollback().await?;
            tracing::debug!(fine_id, "Fine already paid, nothing to do");
            return Ok(fine);
        }

        let fine = FineRepo::mark_paid(&mut *tx, fine.id).await?;
        let borrow = BorrowRepo::lock_by_id(&mut *tx, fine.borrow_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Borrow", fine.borrow_id))?;
        let book = BookRepo::find_by_id_tx(&mut *tx, borrow.book_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Book", borrow.book_id))?;
        let user = UserRepo::contact_by_id(&mut *tx, fine.user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", fine.user_id))?;

        tx.commit().await?;

        tracing::info!(fine_id = fine.id, user_id = fine.user_id, paid_by = actor.id, "Fine paid");
        self.bus.publish(LibraryEvent::FinePaid {
            fine: fine.clone(),
            book: BookRef::from(&book),
            user,
        });

        Ok(fine)
    }

    /// Fine every overdue borrow that has none yet, oldest due date first.
    ///
    /// A failure on one borrow is logged and the sweep moves on; only the
    /// initial selection can fail the whole sweep.
    pub async fn sweep_overdue(&self, today: Date) -> LifecycleResult<SweepReport> {
        let candidates = BorrowRepo::list_overdue_without_fine(&self.pool, today).await?;
        let mut report = SweepReport {
            examined: candidates.len(),
            fines_created: 0,
        };

        for borrow in &candidates {
            match self.check_and_create_fine(borrow, today).await {
                Ok(true) => report.fines_created += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(error = %e, borrow_id = borrow.id, "Failed to create overdue fine");
                }
            }
        }

        tracing::info!(
            examined = report.examined,
            fines_created = report.fines_created,
            "Overdue sweep finished"
        );
        Ok(report)
    }
}
