//! Error type for lifecycle operations.

use unilib_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The database failed; the transaction has been rolled back.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

impl LifecycleError {
    /// The domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(e) => Some(e),
            Self::Database(_) => None,
        }
    }
}
