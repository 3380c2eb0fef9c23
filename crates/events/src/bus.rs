//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`LibraryEvent`]s. It is
//! shared via `Arc<EventBus>` between the lifecycle engine (publisher) and
//! the notification dispatcher (subscriber).

use tokio::sync::broadcast;
use unilib_core::fine::FineStatus;
use unilib_core::types::DbId;
use unilib_db::models::book::Book;
use unilib_db::models::borrow::Borrow;
use unilib_db::models::fine::Fine;
use unilib_db::models::reservation::Reservation;
use unilib_db::models::user::UserContact;

// ---------------------------------------------------------------------------
// LibraryEvent
// ---------------------------------------------------------------------------

/// The few book fields messages need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRef {
    pub id: DbId,
    pub title: String,
    pub author: String,
}

impl From<&Book> for BookRef {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
        }
    }
}

/// A reservation moved to AVAILABLE by a return, with its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotedReservation {
    pub reservation: Reservation,
    pub owner: UserContact,
}

/// A committed lifecycle transition.
///
/// Each variant carries the rows involved plus the contact details needed
/// to compose messages, so consumers never have to re-read the database.
#[derive(Debug, Clone)]
pub enum LibraryEvent {
    BorrowIssued {
        borrow: Borrow,
        book: BookRef,
        borrower: UserContact,
    },
    BorrowReturned {
        borrow: Borrow,
        book: BookRef,
        borrower: UserContact,
        /// `None` when the borrow never had a fine.
        fine_status: Option<FineStatus>,
        promoted: Option<PromotedReservation>,
    },
    FineCreated {
        fine: Fine,
        borrow: Borrow,
        book: BookRef,
        borrower: UserContact,
        overdue_days: i64,
    },
    FinePaid {
        fine: Fine,
        book: BookRef,
        user: UserContact,
    },
    ReservationCreated {
        reservation: Reservation,
        book: BookRef,
        reserver: UserContact,
    },
    ReservationCancelled {
        reservation: Reservation,
        book: BookRef,
        owner: UserContact,
        /// Who cancelled; may be the owner or a staff member.
        actor: UserContact,
    },
}

impl LibraryEvent {
    /// Dot-separated event name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BorrowIssued { .. } => "borrow.issued",
            Self::BorrowReturned { .. } => "borrow.returned",
            Self::FineCreated { .. } => "fine.created",
            Self::FinePaid { .. } => "fine.paid",
            Self::ReservationCreated { .. } => "reservation.created",
            Self::ReservationCancelled { .. } => "reservation.cancelled",
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use unilib_events::bus::EventBus;
///
/// let bus = EventBus::default();
/// let _rx = bus.subscribe();
/// ```
pub struct EventBus {
    sender: broadcast::Sender<LibraryEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: LibraryEvent) {
        tracing::debug!(event = event.name(), "Publishing library event");
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
