use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Order, OrderRepository, OrderState, RepositoryError, RepositoryResult};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory order store implementation for testing and local runs.
///
/// This implementation keeps all orders in memory and provides
/// the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

#[async_trait]
impl OrderRepository for InMemoryOrderStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn insert(&self, order: &Order) -> RepositoryResult<()> {
        let mut orders = self.orders.write().await;

        if orders.contains_key(&order.id()) {
            return Err(RepositoryError::AlreadyExists(order.id()));
        }

        // Same rule as the partial unique index on (user_id, submission_token)
        if let Some(token) = order.submission_token()
            && orders.values().any(|o| {
                o.user_id() == order.user_id() && o.submission_token() == Some(token)
            })
        {
            return Err(RepositoryError::DuplicateSubmission { token });
        }

        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn find(&self, order_id: OrderId) -> RepositoryResult<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn find_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> RepositoryResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .get(&order_id)
            .filter(|o| o.user_id() == user_id)
            .cloned())
    }

    async fn find_by_payment_session(&self, session_id: &str) -> RepositoryResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.payment_session_id() == Some(session_id))
            .cloned())
    }

    async fn find_by_submission_token(
        &self,
        user_id: UserId,
        token: Uuid,
    ) -> RepositoryResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.user_id() == user_id && o.submission_token() == Some(token))
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        states: &[OrderState],
    ) -> RepositoryResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.user_id() == user_id && states.contains(&o.state()))
            .cloned()
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    #[tracing::instrument(skip(self))]
    async fn record_payment_session(
        &self,
        order_id: OrderId,
        session_id: &str,
    ) -> RepositoryResult<bool> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(&order_id) else {
            return Ok(false);
        };
        Ok(order.attach_payment_session(session_id).is_ok())
    }

    #[tracing::instrument(skip(self))]
    async fn update_state(
        &self,
        order_id: OrderId,
        expected: OrderState,
        new_state: OrderState,
    ) -> RepositoryResult<bool> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::NotFound(order_id))?;

        if order.state() != expected {
            return Ok(false);
        }
        order.set_state(new_state);
        Ok(true)
    }
}
