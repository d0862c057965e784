//! Cart operations persisted through a [`SessionStore`].

use common::ProductId;
use rust_decimal::Decimal;
use thiserror::Error;

use super::{Cart, SessionError, SessionStore};
use crate::catalog::ProductRef;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The session backend failed to read or write the cart.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Cart of one session.
///
/// Every mutation loads the cart, applies the change and writes it back.
/// Concurrent requests of the same session are last-write-wins.
#[derive(Debug, Clone)]
pub struct CartStore<S> {
    session: S,
}

impl<S: SessionStore> CartStore<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// Returns the session backing this cart.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Adds one unit of `product`.
    #[tracing::instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&self, product: ProductRef) -> Result<(), CartError> {
        let mut cart = self.get_cart().await?;
        cart.add(product);
        self.session.store_cart(&cart).await?;
        Ok(())
    }

    /// Removes one unit of a product. Absent products are left alone.
    #[tracing::instrument(skip(self))]
    pub async fn decrease(&self, product_id: &ProductId) -> Result<(), CartError> {
        let mut cart = self.get_cart().await?;
        if !cart.decrease(product_id) {
            tracing::debug!(%product_id, "decrease ignored, product not in cart");
            return Ok(());
        }
        self.session.store_cart(&cart).await?;
        Ok(())
    }

    /// Empties the cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self) -> Result<(), CartError> {
        self.session.clear_cart().await?;
        Ok(())
    }

    /// Total number of units in the cart.
    pub async fn full_quantity(&self) -> Result<u64, CartError> {
        Ok(self.get_cart().await?.full_quantity())
    }

    /// Tax-inclusive total of the cart.
    pub async fn total_with_tax(&self) -> Result<Decimal, CartError> {
        Ok(self.get_cart().await?.total_with_tax())
    }

    /// Snapshot of the current cart; empty if none was created yet.
    pub async fn get_cart(&self) -> Result<Cart, CartError> {
        Ok(self.session.load_cart().await?.unwrap_or_default())
    }
}
