//! Checkout error types.

use common::{AddressId, CarrierId, OrderId};
use domain::{CartError, DomainError, OrderError, OrderState, PricingError, RepositoryError};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur during checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The customer has no saved delivery address yet.
    #[error("Customer has no saved delivery address")]
    NoSavedAddress,

    /// The submitted address is unknown or belongs to someone else.
    #[error("Invalid delivery address: {0}")]
    InvalidAddress(AddressId),

    /// The submitted carrier does not exist.
    #[error("Unknown carrier: {0}")]
    UnknownCarrier(CarrierId),

    /// There is nothing to order.
    #[error("Cart is empty")]
    EmptyCart,

    /// Order not found, or not owned by the caller.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// No order of the caller matches the payment session.
    #[error("No order for payment session {0}")]
    PaymentSessionNotFound(String),

    /// Payment can only be started while the order awaits it.
    #[error("Order {order_id} cannot be paid in state {state}")]
    OrderNotPayable { order_id: OrderId, state: OrderState },

    /// The order changed state while the operation was running.
    #[error("Order {0} was modified concurrently")]
    StateChanged(OrderId),

    /// The payment gateway failed.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl CheckoutError {
    /// Returns true if the error is a rejected operator transition.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            CheckoutError::Domain(DomainError::Order(OrderError::InvalidStateTransition { .. }))
        )
    }
}

impl From<OrderError> for CheckoutError {
    fn from(err: OrderError) -> Self {
        CheckoutError::Domain(err.into())
    }
}

impl From<RepositoryError> for CheckoutError {
    fn from(err: RepositoryError) -> Self {
        CheckoutError::Domain(err.into())
    }
}

impl From<CartError> for CheckoutError {
    fn from(err: CartError) -> Self {
        CheckoutError::Domain(err.into())
    }
}

impl From<PricingError> for CheckoutError {
    fn from(err: PricingError) -> Self {
        CheckoutError::Domain(err.into())
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
