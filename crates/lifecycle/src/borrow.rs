//! Borrow lifecycle: issue and return.

use serde::Deserialize;
use unilib_core::borrow::{default_due_date, return_message, validate_due_date};
use unilib_core::error::CoreError;
use unilib_core::fine::FineStatus;
use unilib_core::roles::{self, Action};
use unilib_core::types::{Date, DbId};
use unilib_db::models::borrow::{Borrow, CreateBorrow};
use unilib_db::models::reservation::Reservation;
use unilib_db::models::user::UserContact;
use unilib_db::repositories::{BookRepo, BorrowRepo, FineRepo, ReservationRepo, UserRepo};
use unilib_events::{BookRef, LibraryEvent, PromotedReservation};

use crate::error::LifecycleResult;
use crate::{Actor, Lifecycle};

/// Input for [`Lifecycle::issue`].
#[derive(Debug, Clone, Deserialize)]
pub struct IssueRequest {
    pub book_id: DbId,
    /// Defaults to the actor. Only staff may name someone else.
    pub borrower_id: Option<DbId>,
    /// Ignored for self-service actors, who always get the default loan.
    pub due_date: Option<Date>,
}

/// Result of a successful return.
#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    pub borrow: Borrow,
    /// `None` when the borrow never had a fine.
    pub fine_status: Option<FineStatus>,
    /// The reservation promoted to AVAILABLE by this return, if any.
    pub promoted: Option<Reservation>,
    /// Confirmation text for the actor.
    pub message: String,
}

impl Lifecycle {
    /// Issue a book, taking one copy off the shelf.
    pub async fn issue(
        &self,
        actor: Actor,
        request: &IssueRequest,
        today: Date,
    ) -> LifecycleResult<Borrow> {
        let borrower_id = request.borrower_id.unwrap_or(actor.id);
        let for_self = borrower_id == actor.id;
        if !for_self {
            roles::require(
                actor.role,
                Action::IssueForOthers,
                "You can only borrow books for yourself",
            )?;
        }

        let due_date = if actor.role.is_self_service() {
            default_due_date(today)
        } else {
            let due = request.due_date.unwrap_or_else(|| default_due_date(today));
            validate_due_date(due, today)?;
            due
        };

        let borrower = UserRepo::find_by_id(&self.pool, borrower_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| CoreError::not_found("User", borrower_id))?;
        if !for_self && !borrower.role()?.is_self_service() {
            return Err(CoreError::Validation(
                "Books can only be issued to students and faculty".to_string(),
            )
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let book = BookRepo::lock_by_id(&mut *tx, request.book_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Book", request.book_id))?;

        if BorrowRepo::has_active(&mut *tx, borrower.id, book.id).await? {
            return Err(CoreError::Conflict(format!(
                "User '{}' has already borrowed '{}' and hasn't returned it yet.",
                borrower.full_name(),
                book.title
            ))
            .into());
        }

        let counts = book.copy_counts().checkout()?;
        BookRepo::set_available(&mut *tx, book.id, counts.available).await?;

        let borrow = BorrowRepo::insert(
            &mut *tx,
            &CreateBorrow {
                user_id: borrower.id,
                book_id: book.id,
                issued_by: Some(actor.id),
                issue_date: today,
                due_date,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            borrow_id = borrow.id,
            book_id = book.id,
            user_id = borrower.id,
            issued_by = actor.id,
            available = counts.available,
            "Book issued"
        );
        self.bus.publish(LibraryEvent::BorrowIssued {
            borrow: borrow.clone(),
            book: BookRef::from(&book),
            borrower: UserContact::from(&borrower),
        });

        Ok(borrow)
    }

    /// Return a borrow, put the copy back and promote the next reservation.
    ///
    /// An unpaid fine does not block the return.
    pub async fn return_borrow(
        &self,
        actor: Actor,
        borrow_id: DbId,
        today: Date,
    ) -> LifecycleResult<ReturnOutcome> {
        let mut tx = self.pool.begin().await?;

        let borrow = BorrowRepo::lock_by_id(&mut *tx, borrow_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Borrow", borrow_id))?;
        if !roles::can_return(actor.id, actor.role, borrow.user_id) {
            return Err(CoreError::Forbidden(
                "You don't have permission to return this book".to_string(),
            )
            .into());
        }
        borrow.state().ensure_returnable()?;

        let book = BookRepo::lock_by_id(&mut *tx, borrow.book_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Book", borrow.book_id))?;
        let counts = book.copy_counts().checkin();
        BookRepo::set_available(&mut *tx, book.id, counts.available).await?;

        let borrow = BorrowRepo::mark_returned(&mut *tx, borrow.id, today).await?;
        let fine_status = FineRepo::find_by_borrow(&mut *tx, borrow.id)
            .await?
            .map(|f| f.status());

        let promoted = match ReservationRepo::next_pending_for_book(&mut *tx, book.id).await? {
            Some(next) => Some(ReservationRepo::mark_available(&mut *tx, next.id).await?),
            None => None,
        };

        let borrower = UserRepo::contact_by_id(&mut *tx, borrow.user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", borrow.user_id))?;
        let promoted_owner = match &promoted {
            Some(r) => UserRepo::contact_by_id(&mut *tx, r.user_id).await?,
            None => None,
        };

        tx.commit().await?;

        tracing::info!(
            borrow_id = borrow.id,
            book_id = book.id,
            available = counts.available,
            promoted_reservation = promoted.as_ref().map(|r| r.id),
            "Book returned"
        );

        let message = return_message(fine_status, actor.id == borrow.user_id, &borrower.full_name);
        self.bus.publish(LibraryEvent::BorrowReturned {
            borrow: borrow.clone(),
            book: BookRef::from(&book),
            borrower,
            fine_status,
            promoted: promoted
                .clone()
                .zip(promoted_owner)
                .map(|(reservation, owner)| PromotedReservation { reservation, owner }),
        });

        Ok(ReturnOutcome {
            borrow,
            fine_status,
            promoted,
            message,
        })
    }
}
