//! HTTP route handlers.

pub mod account;
pub mod admin;
pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod views;
