//! Domain layer for the storefront checkout.
//!
//! This crate provides the core domain abstractions including:
//! - Tax-inclusive pricing shared by carts and orders
//! - The session-scoped cart and its store
//! - The order aggregate, its state machine and the repository boundary
//! - Read-only boundaries to the catalog and the customer directory

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod error;
pub mod order;
pub mod pricing;

pub use cart::{
    CART_SESSION_KEY, Cart, CartEntry, CartError, CartStore, InMemorySession, SessionError,
    SessionStore,
};
pub use catalog::{Catalog, InMemoryCatalog, ProductRef};
pub use customer::{Address, Carrier, Customer, CustomerDirectory, InMemoryCustomerDirectory};
pub use error::DomainError;
pub use order::{
    NewOrder, Order, OrderError, OrderLine, OrderRepository, OrderState, RepositoryError,
    RepositoryResult, StateNotice, UnknownStateCode,
};
pub use pricing::{PricedLine, PricingError};
