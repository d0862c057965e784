//! Turns a cart into a persisted order.

use std::sync::Arc;

use common::{AddressId, CarrierId, UserId};
use domain::{
    Address, Carrier, Cart, Customer, CustomerDirectory, NewOrder, Order, OrderRepository,
    RepositoryError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CheckoutError, Result};

/// The order form submitted by the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderForm {
    pub address_id: AddressId,
    pub carrier_id: CarrierId,
    /// Client-generated token identifying one submission of the form.
    #[serde(default)]
    pub submission_token: Option<Uuid>,
}

/// Choices offered on the delivery step.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOptions {
    pub addresses: Vec<Address>,
    pub carriers: Vec<Carrier>,
}

/// Builds orders from carts.
#[derive(Clone)]
pub struct OrderBuilder<R> {
    repository: R,
    directory: Arc<dyn CustomerDirectory>,
}

impl<R: OrderRepository> OrderBuilder<R> {
    pub fn new(repository: R, directory: Arc<dyn CustomerDirectory>) -> Self {
        Self {
            repository,
            directory,
        }
    }

    /// Saved addresses of the customer and the carriers on offer.
    ///
    /// Fails with `NoSavedAddress` when the customer must create an address
    /// first.
    #[tracing::instrument(skip(self))]
    pub async fn delivery_options(&self, user_id: UserId) -> Result<DeliveryOptions> {
        let addresses = self.directory.addresses_for(user_id).await;
        if addresses.is_empty() {
            return Err(CheckoutError::NoSavedAddress);
        }
        let carriers = self.directory.carriers().await;
        Ok(DeliveryOptions {
            addresses,
            carriers,
        })
    }

    /// Places an order for `customer` from the current cart.
    ///
    /// The order and its lines are stored together in `PendingPayment`. The
    /// cart is left untouched. Submitting the same form token twice returns
    /// the order created by the first submission.
    #[tracing::instrument(skip(self, customer, cart, form), fields(user_id = %customer.id))]
    pub async fn place_order(
        &self,
        customer: &Customer,
        cart: &Cart,
        form: &OrderForm,
    ) -> Result<Order> {
        if let Some(existing) = self.existing_submission(customer.id, form).await? {
            return Ok(existing);
        }

        let addresses = self.directory.addresses_for(customer.id).await;
        if addresses.is_empty() {
            return Err(CheckoutError::NoSavedAddress);
        }
        let address = addresses
            .iter()
            .find(|a| a.id == form.address_id)
            .ok_or(CheckoutError::InvalidAddress(form.address_id))?;

        let carrier = self
            .directory
            .find_carrier(form.carrier_id)
            .await
            .ok_or(CheckoutError::UnknownCarrier(form.carrier_id))?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = Order::place(NewOrder {
            user_id: customer.id,
            address,
            carrier: &carrier,
            cart,
            submission_token: form.submission_token,
        })?;

        match self.repository.insert(&order).await {
            Ok(()) => {}
            Err(RepositoryError::DuplicateSubmission { token }) => {
                // Lost the race against a concurrent submission of the same form
                tracing::info!(%token, "duplicate order submission");
                return self
                    .repository
                    .find_by_submission_token(customer.id, token)
                    .await?
                    .ok_or(CheckoutError::Domain(
                        RepositoryError::DuplicateSubmission { token }.into(),
                    ));
            }
            Err(e) => return Err(e.into()),
        }

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id(),
            lines = order.lines().len(),
            total = %order.total_with_tax(),
            "order created"
        );
        Ok(order)
    }

    async fn existing_submission(&self, user_id: UserId, form: &OrderForm) -> Result<Option<Order>> {
        let Some(token) = form.submission_token else {
            return Ok(None);
        };
        let existing = self
            .repository
            .find_by_submission_token(user_id, token)
            .await?;
        if let Some(order) = &existing {
            tracing::info!(order_id = %order.id(), %token, "order form already submitted");
        }
        Ok(existing)
    }
}
