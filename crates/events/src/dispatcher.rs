//! Background delivery of lifecycle notifications.
//!
//! [`NotificationDispatcher`] subscribes to the [`EventBus`](crate::bus::EventBus),
//! composes deliveries for every [`LibraryEvent`] and performs them. The
//! transition that produced the event has already committed, so every
//! failure here is logged and dropped.

use std::sync::Arc;

use tokio::sync::broadcast;
use unilib_db::repositories::{NotificationRepo, UserRepo};
use unilib_db::DbPool;

use crate::bus::LibraryEvent;
use crate::compose::{compose, Delivery, Links};
use crate::delivery::email::Mailer;

/// Writes in-app notifications and sends emails for library events.
#[derive(Clone)]
pub struct NotificationDispatcher {
    pool: DbPool,
    mailer: Arc<dyn Mailer>,
    links: Links,
}

impl NotificationDispatcher {
    pub fn new(pool: DbPool, mailer: Arc<dyn Mailer>, links: Links) -> Self {
        Self {
            pool,
            mailer,
            links,
        }
    }

    /// Run the delivery loop until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<LibraryEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.handle(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Notification dispatcher lagged, some events were not delivered"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver everything one event calls for. Never fails.
    pub async fn handle(&self, event: &LibraryEvent) {
        let staff = match UserRepo::staff_contacts(&self.pool).await {
            Ok(staff) => staff,
            Err(e) => {
                // Still deliver to the people directly involved.
                tracing::error!(error = %e, event = event.name(), "Failed to load staff contacts");
                Vec::new()
            }
        };

        let deliveries = compose(event, &staff, &self.links);
        tracing::debug!(
            event = event.name(),
            count = deliveries.len(),
            "Dispatching notifications"
        );

        for delivery in deliveries {
            match delivery {
                Delivery::InApp(notification) => {
                    if let Err(e) = NotificationRepo::create(&self.pool, &notification).await {
                        tracing::error!(
                            error = %e,
                            event = event.name(),
                            user_id = notification.user_id,
                            "Failed to write notification"
                        );
                    }
                }
                Delivery::Email(email) => {
                    if let Err(e) = self.mailer.send(&email).await {
                        tracing::error!(
                            error = %e,
                            event = event.name(),
                            to = %email.to,
                            "Failed to send notification email"
                        );
                    }
                }
            }
        }
    }
}
