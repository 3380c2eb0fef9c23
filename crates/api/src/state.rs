use std::sync::Arc;

use unilib_lifecycle::Lifecycle;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: unilib_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus the lifecycle engine publishes on.
    pub event_bus: Arc<unilib_events::EventBus>,
    /// Borrow, fine and reservation transitions.
    pub lifecycle: Lifecycle,
}

impl AppState {
    pub fn new(pool: unilib_db::DbPool, config: ServerConfig) -> Self {
        let event_bus = Arc::new(unilib_events::EventBus::default());
        let lifecycle = Lifecycle::new(pool.clone(), Arc::clone(&event_bus));
        Self {
            pool,
            config: Arc::new(config),
            event_bus,
            lifecycle,
        }
    }
}
