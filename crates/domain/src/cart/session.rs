//! Session storage abstraction used by the cart.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use super::Cart;

/// Key under which the cart lives in the session.
pub const CART_SESSION_KEY: &str = "cart";

/// Failure reported by the underlying session backend.
#[derive(Debug, Error)]
#[error("Session store error: {0}")]
pub struct SessionError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl SessionError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }
}

/// Per-session key/value storage holding one visitor's cart.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the stored cart, or `None` if none was created yet.
    async fn load_cart(&self) -> Result<Option<Cart>, SessionError>;

    /// Replaces the stored cart.
    async fn store_cart(&self, cart: &Cart) -> Result<(), SessionError>;

    /// Removes the cart from the session.
    async fn clear_cart(&self) -> Result<(), SessionError>;
}

/// Session storage kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySession {
    cart: Arc<RwLock<Option<Cart>>>,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once a cart has been written and not cleared.
    pub async fn has_cart(&self) -> bool {
        self.cart.read().await.is_some()
    }
}

#[async_trait]
impl SessionStore for InMemorySession {
    async fn load_cart(&self) -> Result<Option<Cart>, SessionError> {
        Ok(self.cart.read().await.clone())
    }

    async fn store_cart(&self, cart: &Cart) -> Result<(), SessionError> {
        *self.cart.write().await = Some(cart.clone());
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), SessionError> {
        *self.cart.write().await = None;
        Ok(())
    }
}
