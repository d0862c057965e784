//! Payment gateway boundary and its implementations.

mod http;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::{HttpGatewayConfig, HttpPaymentGateway};
pub use memory::InMemoryPaymentGateway;

/// Errors returned by a payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request could not be sent or the response not read.
    #[error("Gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("Gateway rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The gateway answered with a body we cannot use.
    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),

    /// The gateway is not available.
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

/// Payment mode of a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    /// One-off payment.
    #[default]
    Payment,
}

/// One line of a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayLineItem {
    /// Tax-inclusive unit amount in minor units (cents).
    pub unit_amount_minor: i64,
    pub currency: String,
    pub quantity: u32,
    pub product_name: String,
    pub product_images: Vec<String>,
}

/// Request for a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub customer_email: String,
    pub line_items: Vec<GatewayLineItem>,
    pub mode: PaymentMode,
    /// Contains the `{SESSION_ID}` placeholder the gateway substitutes.
    pub success_url: String,
    pub cancel_url: String,
}

/// A hosted checkout session created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    /// Where the customer is sent to pay.
    pub redirect_url: String,
}

/// Trait for hosted checkout providers.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a checkout session for one payment attempt.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError>;
}
