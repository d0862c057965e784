//! Hand-off to the payment gateway and confirmation on return.

use std::sync::Arc;
use std::time::Instant;

use common::{OrderId, UserId};
use domain::{CartStore, Customer, Order, OrderRepository, OrderState, SessionStore, pricing};

use crate::error::{CheckoutError, Result};
use crate::gateway::{
    CheckoutSession, CheckoutSessionRequest, GatewayLineItem, PaymentGateway, PaymentMode,
};
use crate::state_machine::OrderStateMachine;

/// Placeholder the gateway replaces with the session id in the success URL.
pub const SESSION_ID_PLACEHOLDER: &str = "{SESSION_ID}";

const CURRENCY: &str = "eur";

/// Public URLs handed to the gateway.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    base_url: String,
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Where the gateway sends the customer after paying.
    pub fn success_url(&self) -> String {
        format!("{}/order/thanks/{SESSION_ID_PLACEHOLDER}", self.base_url)
    }

    /// Where the gateway sends the customer after giving up.
    pub fn cancel_url(&self) -> String {
        format!("{}/cart/cancelled", self.base_url)
    }

    /// Public URL of a product illustration.
    pub fn product_image(&self, illustration: &str) -> String {
        format!("{}/uploads/{illustration}", self.base_url)
    }
}

/// Outcome of the payment-success callback.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub order: Order,
    /// True only for the call that moved the order to `Paid`.
    pub newly_paid: bool,
}

/// Opens checkout sessions and confirms payments.
#[derive(Clone)]
pub struct PaymentService<R> {
    repository: R,
    gateway: Arc<dyn PaymentGateway>,
    state_machine: OrderStateMachine<R>,
    urls: CheckoutUrls,
}

impl<R: OrderRepository + Clone> PaymentService<R> {
    pub fn new(
        repository: R,
        gateway: Arc<dyn PaymentGateway>,
        state_machine: OrderStateMachine<R>,
        urls: CheckoutUrls,
    ) -> Self {
        Self {
            repository,
            gateway,
            state_machine,
            urls,
        }
    }

    /// Builds the gateway request for an order.
    ///
    /// One line item per order line at the tax-inclusive unit price, plus one
    /// for the carrier.
    pub fn session_request(&self, order: &Order, customer_email: &str) -> Result<CheckoutSessionRequest> {
        let mut line_items = order
            .lines()
            .iter()
            .map(|line| {
                Ok(GatewayLineItem {
                    unit_amount_minor: pricing::to_minor_units(line.unit_price_with_tax())?,
                    currency: CURRENCY.to_string(),
                    quantity: line.quantity,
                    product_name: line.product_name.clone(),
                    product_images: vec![self.urls.product_image(&line.product_illustration)],
                })
            })
            .collect::<Result<Vec<_>>>()?;

        line_items.push(GatewayLineItem {
            unit_amount_minor: pricing::to_minor_units(order.carrier_price())?,
            currency: CURRENCY.to_string(),
            quantity: 1,
            product_name: format!("Carrier: {}", order.carrier_name()),
            product_images: Vec::new(),
        });

        Ok(CheckoutSessionRequest {
            customer_email: customer_email.to_string(),
            line_items,
            mode: PaymentMode::Payment,
            success_url: self.urls.success_url(),
            cancel_url: self.urls.cancel_url(),
        })
    }

    /// Opens a checkout session for one of the customer's pending orders.
    ///
    /// The session id is stored on the order before it is returned. When the
    /// gateway fails nothing is written and the call can be retried.
    #[tracing::instrument(skip(self, customer), fields(user_id = %customer.id))]
    pub async fn start_payment(&self, order_id: OrderId, customer: &Customer) -> Result<CheckoutSession> {
        let order = self
            .repository
            .find_for_user(order_id, customer.id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        if order.state() != OrderState::PendingPayment {
            return Err(CheckoutError::OrderNotPayable {
                order_id,
                state: order.state(),
            });
        }

        let request = self.session_request(&order, &customer.email)?;

        let start = Instant::now();
        let result = self.gateway.create_checkout_session(&request).await;
        metrics::histogram!("gateway_request_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        let session = match result {
            Ok(session) => session,
            Err(e) => {
                metrics::counter!("checkout_session_failures_total").increment(1);
                tracing::warn!(%order_id, error = %e, "checkout session creation failed");
                return Err(e.into());
            }
        };

        let recorded = self
            .repository
            .record_payment_session(order_id, &session.session_id)
            .await?;
        if !recorded {
            return Err(CheckoutError::StateChanged(order_id));
        }

        metrics::counter!("checkout_sessions_created_total").increment(1);
        tracing::info!(%order_id, session_id = %session.session_id, "checkout session created");
        Ok(session)
    }

    /// Handles the customer's return from the gateway.
    ///
    /// Only the first call for a pending order marks it paid and empties the
    /// cart; later calls return the order unchanged.
    #[tracing::instrument(skip(self, cart))]
    pub async fn confirm_payment<S: SessionStore>(
        &self,
        session_id: &str,
        user_id: UserId,
        cart: &CartStore<S>,
    ) -> Result<PaymentConfirmation> {
        let mut order = self
            .repository
            .find_by_payment_session(session_id)
            .await?
            .filter(|o| o.user_id() == user_id)
            .ok_or_else(|| CheckoutError::PaymentSessionNotFound(session_id.to_string()))?;

        if order.state() != OrderState::PendingPayment {
            return Ok(PaymentConfirmation {
                order,
                newly_paid: false,
            });
        }

        let newly_paid = self.state_machine.mark_paid(order.id()).await?;
        if newly_paid {
            order.confirm_payment();
            // The payment is recorded; a stale cart must not turn it into an error
            if let Err(error) = cart.remove().await {
                tracing::warn!(order_id = %order.id(), %error, "failed to clear cart after payment");
            }
            metrics::counter!("payments_confirmed_total").increment(1);
        } else if let Some(current) = self.repository.find(order.id()).await? {
            order = current;
        }

        Ok(PaymentConfirmation { order, newly_paid })
    }
}
