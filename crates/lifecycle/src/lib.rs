//! Lifecycle engine for borrows, fines and reservations.
//!
//! Every operation runs as one Postgres transaction. Copy counts change
//! only under a row lock on the book, and events are published on the
//! [`EventBus`] after the transaction commits.

use std::sync::Arc;

use unilib_core::roles::Role;
use unilib_core::types::DbId;
use unilib_db::DbPool;
use unilib_events::EventBus;

pub mod borrow;
pub mod error;
pub mod fine;
pub mod reservation;

pub use borrow::{IssueRequest, ReturnOutcome};
pub use error::{LifecycleError, LifecycleResult};
pub use fine::SweepReport;
pub use reservation::ReserveRequest;

/// The authenticated user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: DbId, role: Role) -> Self {
        Self { id, role }
    }
}

/// Entry point for every lifecycle transition.
#[derive(Clone)]
pub struct Lifecycle {
    pool: DbPool,
    bus: Arc<EventBus>,
}

impl Lifecycle {
    pub fn new(pool: DbPool, bus: Arc<EventBus>) -> Self {
        Self { pool, bus }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}
