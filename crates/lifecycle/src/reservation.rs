//! Reservation lifecycle: reserve and cancel.
//!
//! Promotion (PENDING -> AVAILABLE) happens only as part of a return; see
//! [`Lifecycle::return_borrow`].

use serde::Deserialize;
use unilib_core::error::CoreError;
use unilib_core::roles::{self, Action};
use unilib_core::types::DbId;
use unilib_db::models::reservation::Reservation;
use unilib_db::models::user::UserContact;
use unilib_db::repositories::{BookRepo, ReservationRepo, UserRepo};
use unilib_events::{BookRef, LibraryEvent};

use crate::error::LifecycleResult;
use crate::{Actor, Lifecycle};

/// Input for [`Lifecycle::reserve`].
#[derive(Debug, Clone, Deserialize)]
pub struct ReserveRequest {
    pub book_id: DbId,
    /// Defaults to the actor. Only staff may reserve for someone else.
    pub user_id: Option<DbId>,
}

impl Lifecycle {
    /// Queue a PENDING reservation.
    ///
    /// Self-service users may only reserve books with no copy on the shelf;
    /// staff may reserve at any availability level.
    pub async fn reserve(
        &self,
        actor: Actor,
        request: &ReserveRequest,
    ) -> LifecycleResult<Reservation> {
        let reserver_id = request.user_id.unwrap_or(actor.id);
        let for_self = reserver_id == actor.id;
        if !for_self {
            roles::require(
                actor.role,
                Action::ReserveForOthers,
                "You can only reserve books for yourself",
            )?;
        }

        let reserver = UserRepo::find_by_id(&self.pool, reserver_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| CoreError::not_found("User", reserver_id))?;
        if !for_self && !reserver.role()?.is_self_service() {
            return Err(CoreError::Validation(
                "Books can only be reserved for students and faculty".to_string(),
            )
            .into());
        }

        let book = BookRepo::find_by_id(&self.pool, request.book_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Book", request.book_id))?;
        if actor.role.is_self_service() && book.copy_counts().is_available() {
            return Err(CoreError::Validation(format!(
                "'{}' is currently available. Borrow it instead of reserving.",
                book.title
            ))
            .into());
        }

        let mut tx = self.pool.begin().await?;
        let reservation = ReservationRepo::create(&mut *tx, reserver.id, book.id).await?;
        tx.commit().await?;

        tracing::info!(
            reservation_id = reservation.id,
            book_id = book.id,
            user_id = reserver.id,
            "Reservation created"
        );
        self.bus.publish(LibraryEvent::ReservationCreated {
            reservation: reservation.clone(),
            book: BookRef::from(&book),
            reserver: UserContact::from(&reserver),
        });

        Ok(reservation)
    }

    /// Cancel a PENDING or AVAILABLE reservation. Owner or staff only.
    pub async fn cancel_reservation(
        &self,
        actor: Actor,
        reservation_id: DbId,
    ) -> LifecycleResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        let reservation = ReservationRepo::lock_by_id(&mut *tx, reservation_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Reservation", reservation_id))?;
        if !roles::can_cancel(actor.id, actor.role, reservation.user_id) {
            return Err(CoreError::Forbidden(
                "You don't have permission to cancel this reservation.".to_string(),
            )
            .into());
        }
        reservation.status()?.ensure_cancellable()?;

        let reservation = ReservationRepo::mark_cancelled(&mut *tx, reservation.id).await?;
        let book = BookRepo::find_by_id_tx(&mut *tx, reservation.book_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Book", reservation.book_id))?;
        let owner = UserRepo::contact_by_id(&mut *tx, reservation.user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", reservation.user_id))?;
        let actor_contact = UserRepo::contact_by_id(&mut *tx, actor.id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", actor.id))?;

        tx.commit().await?;

        tracing::info!(
            reservation_id = reservation.id,
            cancelled_by = actor.id,
            "Reservation cancelled"
        );
        self.bus.publish(LibraryEvent::ReservationCancelled {
            reservation: reservation.clone(),
            book: BookRef::from(&book),
            owner,
            actor: actor_contact,
        });

        Ok(reservation)
    }
}
