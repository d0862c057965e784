//! Order state transitions and the notifications they trigger.

use std::collections::BTreeMap;
use std::sync::Arc;

use common::OrderId;
use domain::{CustomerDirectory, Order, OrderRepository, OrderState};

use crate::error::{CheckoutError, Result};
use crate::notifier::{Notification, Notifier};

/// Result of an operator transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// The order after the transition.
    pub order: Order,
    /// False when the order already was in the requested state.
    pub changed: bool,
    /// True when the customer was notified.
    pub notified: bool,
}

/// Applies state changes to stored orders.
///
/// Every write is a compare-and-set on the state read before, so two
/// concurrent changes of one order cannot both apply.
#[derive(Clone)]
pub struct OrderStateMachine<R> {
    repository: R,
    directory: Arc<dyn CustomerDirectory>,
    notifier: Arc<dyn Notifier>,
}

impl<R: OrderRepository> OrderStateMachine<R> {
    pub fn new(
        repository: R,
        directory: Arc<dyn CustomerDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repository,
            directory,
            notifier,
        }
    }

    /// Moves a pending order to `Paid`.
    ///
    /// Returns false if the order was not pending anymore; the payment
    /// callback relies on this to apply the transition exactly once.
    #[tracing::instrument(skip(self))]
    pub async fn mark_paid(&self, order_id: OrderId) -> Result<bool> {
        let applied = self
            .repository
            .update_state(order_id, OrderState::PendingPayment, OrderState::Paid)
            .await?;

        if applied {
            metrics::counter!("order_state_transitions_total", "state" => OrderState::Paid.as_str())
                .increment(1);
            tracing::info!(%order_id, "order paid");
        }
        Ok(applied)
    }

    /// Applies an operator transition and notifies the customer.
    ///
    /// Moving an order to the state it is already in changes nothing and
    /// sends nothing. A failed notification does not undo the transition.
    #[tracing::instrument(skip(self))]
    pub async fn transition(&self, order_id: OrderId, target: OrderState) -> Result<TransitionOutcome> {
        let mut order = self
            .repository
            .find(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        let from = order.state();
        if !order.transition_to(target)? {
            tracing::debug!(%order_id, state = %from, "order already in requested state");
            return Ok(TransitionOutcome {
                order,
                changed: false,
                notified: false,
            });
        }

        if !self.repository.update_state(order_id, from, target).await? {
            return Err(CheckoutError::StateChanged(order_id));
        }

        metrics::counter!("order_state_transitions_total", "state" => target.as_str()).increment(1);
        tracing::info!(%order_id, %from, to = %target, "order state changed");

        let notified = self.notify(&order).await;
        Ok(TransitionOutcome {
            order,
            changed: true,
            notified,
        })
    }

    async fn notify(&self, order: &Order) -> bool {
        let Some(notice) = order.state().notice() else {
            return false;
        };

        let Some(customer) = self.directory.find_customer(order.user_id()).await else {
            tracing::warn!(order_id = %order.id(), user_id = %order.user_id(), "order owner not found, skipping notification");
            return false;
        };

        let notification = Notification {
            to_email: customer.email.clone(),
            to_name: customer.full_name(),
            subject: notice.email_subject.to_string(),
            template: notice.email_template.to_string(),
            vars: BTreeMap::from([
                ("firstname".to_string(), customer.first_name.clone()),
                ("order_id".to_string(), order.id().to_string()),
            ]),
        };

        match self.notifier.send(notification).await {
            Ok(()) => {
                metrics::counter!("notifications_sent_total").increment(1);
                true
            }
            Err(e) => {
                tracing::warn!(order_id = %order.id(), error = %e, "state change notification failed");
                false
            }
        }
    }
}
