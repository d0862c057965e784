use domain::RepositoryError;
use thiserror::Error;

/// Errors that can occur inside the PostgreSQL order store.
#[derive(Debug, Error)]
pub enum OrderStoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value is outside the range the domain accepts.
    #[error("Invalid stored value: {0}")]
    InvalidRow(String),

    /// The operation hit a domain-level conflict.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, OrderStoreError>;

impl From<OrderStoreError> for RepositoryError {
    fn from(err: OrderStoreError) -> Self {
        match err {
            OrderStoreError::Repository(inner) => inner,
            OrderStoreError::InvalidRow(msg) => RepositoryError::Corrupt(msg),
            other => RepositoryError::backend(other),
        }
    }
}
