//! Catalog, customer and carrier records loaded at start-up.
//!
//! Products, accounts and carriers are managed by other systems. For local
//! runs they are read from a JSON file into the in-memory boundaries.

use std::path::Path;

use common::AddressId;
use domain::{
    Address, Carrier, Customer, InMemoryCatalog, InMemoryCustomerDirectory, ProductRef,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An address as written in the seed file, owned by the enclosing customer.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAddress {
    pub id: AddressId,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCustomer {
    #[serde(flatten)]
    pub customer: Customer,
    #[serde(default)]
    pub addresses: Vec<SeedAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub products: Vec<ProductRef>,
    #[serde(default)]
    pub customers: Vec<SeedCustomer>,
    #[serde(default)]
    pub carriers: Vec<Carrier>,
}

impl SeedData {
    pub async fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Writes every record into the in-memory catalog and directory.
    pub async fn apply(self, catalog: &InMemoryCatalog, directory: &InMemoryCustomerDirectory) {
        tracing::info!(
            products = self.products.len(),
            customers = self.customers.len(),
            carriers = self.carriers.len(),
            "applying seed data"
        );

        for product in self.products {
            catalog.insert(product).await;
        }
        for carrier in self.carriers {
            directory.add_carrier(carrier).await;
        }
        for SeedCustomer {
            customer,
            addresses,
        } in self.customers
        {
            for a in addresses {
                directory
                    .add_address(Address {
                        id: a.id,
                        user_id: customer.id,
                        first_name: a.first_name,
                        last_name: a.last_name,
                        street: a.street,
                        postal_code: a.postal_code,
                        city: a.city,
                        country: a.country,
                        phone: a.phone,
                    })
                    .await;
            }
            directory.add_customer(customer).await;
        }
    }
}
