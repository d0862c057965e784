//! Read-only boundary to the product catalog.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::pricing;

/// A product as the catalog currently describes it.
///
/// Carts hold these by value; orders copy the relevant fields into
/// [`OrderLine`](crate::OrderLine) snapshots at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    /// Unit price before tax.
    pub unit_price: Decimal,
    /// Tax rate in percent.
    pub tax_rate_percent: Decimal,
    /// Illustration file name, relative to the public uploads directory.
    pub illustration: String,
}

impl ProductRef {
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Decimal,
        tax_rate_percent: Decimal,
        illustration: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            tax_rate_percent,
            illustration: illustration.into(),
        }
    }

    /// Tax-inclusive unit price.
    pub fn price_with_tax(&self) -> Decimal {
        pricing::unit_price_with_tax(self.unit_price, self.tax_rate_percent)
    }
}

/// Lookup of catalog products.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns the product with the given id, if it exists.
    async fn find_product(&self, id: &ProductId) -> Option<ProductRef>;
}

/// In-memory catalog for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<ProductId, ProductRef>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog pre-filled with `products`.
    pub fn with_products(products: impl IntoIterator<Item = ProductRef>) -> Self {
        let map = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            products: Arc::new(RwLock::new(map)),
        }
    }

    /// Inserts or replaces a product.
    pub async fn insert(&self, product: ProductRef) {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
    }

    /// Changes the pre-tax price of an existing product.
    ///
    /// Returns false if the product is unknown.
    pub async fn set_price(&self, id: &ProductId, unit_price: Decimal) -> bool {
        match self.products.write().await.get_mut(id) {
            Some(product) => {
                product.unit_price = unit_price;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn find_product(&self, id: &ProductId) -> Option<ProductRef> {
        self.products.read().await.get(id).cloned()
    }
}
