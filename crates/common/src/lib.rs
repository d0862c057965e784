//! Shared types used across the storefront checkout crates.

pub mod types;

pub use types::{AddressId, CarrierId, OrderId, ProductId, UserId};
