//! Checkout workflow for the storefront.
//!
//! This crate turns a session cart into a persisted order and settles it
//! through an external payment gateway:
//! 1. Build the order from the cart, a saved address and a carrier
//! 2. Open a hosted checkout session and remember its id on the order
//! 3. Confirm the payment when the customer comes back from the gateway
//!
//! Operator-driven state changes go through [`OrderStateMachine`], which
//! notifies the customer.

pub mod error;
pub mod gateway;
pub mod notifier;
pub mod order_builder;
pub mod payment;
pub mod state_machine;

pub use error::{CheckoutError, Result};
pub use gateway::{
    CheckoutSession, CheckoutSessionRequest, GatewayError, GatewayLineItem, HttpGatewayConfig,
    HttpPaymentGateway, InMemoryPaymentGateway, PaymentGateway, PaymentMode,
};
pub use notifier::{InMemoryNotifier, Notification, Notifier, NotifierError, TracingNotifier};
pub use order_builder::{DeliveryOptions, OrderBuilder, OrderForm};
pub use payment::{CheckoutUrls, PaymentConfirmation, PaymentService, SESSION_ID_PLACEHOLDER};
pub use state_machine::{OrderStateMachine, TransitionOutcome};
