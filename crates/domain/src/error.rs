//! Domain error types.

use thiserror::Error;

use crate::cart::CartError;
use crate::order::{OrderError, RepositoryError};
use crate::pricing::PricingError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the order aggregate.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// The cart could not be read from or written to the session.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// An error occurred in order storage.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// An amount could not be converted.
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),
}
