use async_trait::async_trait;
use common::{OrderId, UserId};
use thiserror::Error;
use uuid::Uuid;

use super::{Order, OrderState};

/// Errors raised by order persistence.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No order with this id exists.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// An order with this id is already stored.
    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// The customer already placed an order with this submission token.
    #[error("Order already submitted with token {token}")]
    DuplicateSubmission { token: Uuid },

    /// A stored row could not be turned back into an order.
    #[error("Corrupt order record: {0}")]
    Corrupt(String),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Durable storage for orders and their lines.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order with all of its lines.
    ///
    /// Either the order and every line are stored, or nothing is.
    async fn insert(&self, order: &Order) -> RepositoryResult<()>;

    /// Loads an order by id.
    async fn find(&self, order_id: OrderId) -> RepositoryResult<Option<Order>>;

    /// Loads an order by id, only if it belongs to `user_id`.
    async fn find_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> RepositoryResult<Option<Order>>;

    /// Loads the order whose latest payment attempt used `session_id`.
    async fn find_by_payment_session(&self, session_id: &str) -> RepositoryResult<Option<Order>>;

    /// Loads the order a customer placed with a given submission token.
    async fn find_by_submission_token(
        &self,
        user_id: UserId,
        token: Uuid,
    ) -> RepositoryResult<Option<Order>>;

    /// Lists a customer's orders in any of `states`, newest first.
    async fn list_for_user(
        &self,
        user_id: UserId,
        states: &[OrderState],
    ) -> RepositoryResult<Vec<Order>>;

    /// Stores the checkout session id of a payment attempt.
    ///
    /// Only applies while the order awaits payment. Returns false otherwise.
    async fn record_payment_session(
        &self,
        order_id: OrderId,
        session_id: &str,
    ) -> RepositoryResult<bool>;

    /// Moves an order from `expected` to `new_state`.
    ///
    /// Returns false, leaving the order untouched, when its current state is
    /// not `expected`. Fails with `NotFound` when there is no such order.
    async fn update_state(
        &self,
        order_id: OrderId,
        expected: OrderState,
        new_state: OrderState,
    ) -> RepositoryResult<bool>;
}
