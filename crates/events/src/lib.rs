//! Library event bus and notification infrastructure.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`LibraryEvent`] -- lifecycle transitions published after commit.
//! - [`compose`] -- pure mapping from an event to in-app and email deliveries.
//! - [`delivery`] -- email transports behind the [`Mailer`] trait.
//! - [`NotificationDispatcher`] -- background consumer that performs the
//!   deliveries, logging and swallowing every failure.

pub mod bus;
pub mod compose;
pub mod delivery;
pub mod dispatcher;

pub use bus::{BookRef, EventBus, LibraryEvent, PromotedReservation};
pub use compose::{compose, Delivery, Links, OutgoingEmail};
pub use delivery::email::{mailer_from_env, EmailConfig, EmailError, LogMailer, Mailer, SmtpMailer};
pub use dispatcher::NotificationDispatcher;
