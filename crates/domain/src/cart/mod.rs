//! Session-scoped shopping cart.

mod session;
mod store;

use std::collections::HashMap;

use common::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::ProductRef;
use crate::pricing::{self, PricedLine};

pub use session::{CART_SESSION_KEY, InMemorySession, SessionError, SessionStore};
pub use store::{CartError, CartStore};

/// One product in the cart.
///
/// `quantity` is at least 1: an entry whose quantity would drop to zero is
/// removed from the cart instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product: ProductRef,
    pub quantity: u32,
}

impl PricedLine for CartEntry {
    fn unit_price(&self) -> Decimal {
        self.product.unit_price
    }

    fn tax_rate_percent(&self) -> Decimal {
        self.product.tax_rate_percent
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Mapping from product id to cart entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: HashMap<ProductId, CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `product`, inserting it with quantity 1 if absent.
    ///
    /// The stored snapshot is refreshed with the given product data.
    pub fn add(&mut self, product: ProductRef) {
        match self.entries.get_mut(&product.id) {
            Some(entry) => {
                entry.quantity = entry.quantity.saturating_add(1);
                entry.product = product;
            }
            None => {
                self.entries.insert(
                    product.id.clone(),
                    CartEntry {
                        product,
                        quantity: 1,
                    },
                );
            }
        }
    }

    /// Removes one unit of a product; drops the entry when it reaches zero.
    ///
    /// Returns false when the product is not in the cart.
    pub fn decrease(&mut self, product_id: &ProductId) -> bool {
        let Some(entry) = self.entries.get_mut(product_id) else {
            return false;
        };

        if entry.quantity > 1 {
            entry.quantity -= 1;
        } else {
            self.entries.remove(product_id);
        }
        true
    }

    pub fn get(&self, product_id: &ProductId) -> Option<&CartEntry> {
        self.entries.get(product_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CartEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of quantities across all entries.
    pub fn full_quantity(&self) -> u64 {
        self.entries.values().map(|e| u64::from(e.quantity)).sum()
    }

    /// Sum of tax-inclusive line totals across all entries.
    pub fn total_with_tax(&self) -> Decimal {
        pricing::subtotal_with_tax(self.entries.values())
    }
}
