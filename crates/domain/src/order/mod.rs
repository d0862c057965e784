//! Order aggregate and related types.

mod aggregate;
mod repository;
mod state;

pub use aggregate::{NewOrder, Order, OrderLine};
pub use repository::{OrderRepository, RepositoryError, RepositoryResult};
pub use state::{OrderState, StateNotice, UnknownStateCode};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The requested state change is not allowed.
    #[error("Invalid state transition: cannot move order from {from} to {to}")]
    InvalidStateTransition { from: OrderState, to: OrderState },

    /// Payment can only be attached to an order awaiting payment.
    #[error("Order is not awaiting payment (state {state})")]
    NotAwaitingPayment { state: OrderState },

    /// Order has no lines.
    #[error("Order has no lines")]
    NoLines,

    /// The delivery address belongs to another customer.
    #[error("Delivery address does not belong to the customer")]
    AddressNotOwned,
}
