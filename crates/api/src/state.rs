//! Shared application state.

use std::sync::Arc;

use axum::http::HeaderName;
use axum::http::header::InvalidHeaderName;
use checkout::{
    CheckoutUrls, GatewayError, Notifier, OrderBuilder, OrderStateMachine, PaymentGateway,
    PaymentService,
};
use domain::{Catalog, CustomerDirectory, OrderRepository};
use secrecy::SecretString;
use thiserror::Error;

/// How callers are identified.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Header set by the upstream authentication proxy with the user id.
    pub user_header: HeaderName,
    /// Bearer token required on `/admin` routes. Admin is closed when `None`.
    pub operator_token: Option<SecretString>,
}

impl AuthSettings {
    pub fn new(user_header: &str, operator_token: Option<SecretString>) -> Result<Self, SetupError> {
        Ok(Self {
            user_header: HeaderName::try_from(user_header)?,
            operator_token,
        })
    }
}

/// Errors raised while wiring the application together.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid authentication header name: {0}")]
    InvalidHeader(#[from] InvalidHeaderName),

    #[error("Payment gateway setup failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Shared application state holding the checkout services.
pub struct AppState<R> {
    pub catalog: Arc<dyn Catalog>,
    pub directory: Arc<dyn CustomerDirectory>,
    pub orders: R,
    pub builder: OrderBuilder<R>,
    pub payments: PaymentService<R>,
    pub state_machine: OrderStateMachine<R>,
    pub auth: AuthSettings,
}

impl<R: OrderRepository + Clone + 'static> AppState<R> {
    pub fn new(
        orders: R,
        catalog: Arc<dyn Catalog>,
        directory: Arc<dyn CustomerDirectory>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        urls: CheckoutUrls,
        auth: AuthSettings,
    ) -> Self {
        let state_machine = OrderStateMachine::new(orders.clone(), directory.clone(), notifier);
        let builder = OrderBuilder::new(orders.clone(), directory.clone());
        let payments = PaymentService::new(orders.clone(), gateway, state_machine.clone(), urls);

        Self {
            catalog,
            directory,
            orders,
            builder,
            payments,
            state_machine,
            auth,
        }
    }
}
