//! Boundary to customer accounts, saved addresses and carriers.
//!
//! These records are owned elsewhere; the checkout core only reads them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AddressId, CarrierId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Customer {
    /// `"first last"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A delivery address saved by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub phone: String,
}

impl Address {
    /// Renders the fixed multi-line snapshot stored on orders.
    ///
    /// Lines: name, street, postal code + city, country, phone.
    pub fn delivery_text(&self) -> String {
        format!(
            "{} {}\n{}\n{} {}\n{}\n{}",
            self.first_name,
            self.last_name,
            self.street,
            self.postal_code,
            self.city,
            self.country,
            self.phone
        )
    }
}

/// A delivery option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    pub id: CarrierId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
}

/// Read access to customers, their addresses and the carriers on offer.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn find_customer(&self, user_id: UserId) -> Option<Customer>;

    /// Saved addresses of a customer, oldest first.
    async fn addresses_for(&self, user_id: UserId) -> Vec<Address>;

    async fn carriers(&self) -> Vec<Carrier>;

    async fn find_carrier(&self, carrier_id: CarrierId) -> Option<Carrier>;
}

#[derive(Debug, Default)]
struct DirectoryState {
    customers: HashMap<UserId, Customer>,
    addresses: Vec<Address>,
    carriers: Vec<Carrier>,
}

/// In-memory directory for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_customer(&self, customer: Customer) {
        self.state
            .write()
            .await
            .customers
            .insert(customer.id, customer);
    }

    pub async fn add_address(&self, address: Address) {
        self.state.write().await.addresses.push(address);
    }

    pub async fn add_carrier(&self, carrier: Carrier) {
        self.state.write().await.carriers.push(carrier);
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn find_customer(&self, user_id: UserId) -> Option<Customer> {
        self.state.read().await.customers.get(&user_id).cloned()
    }

    async fn addresses_for(&self, user_id: UserId) -> Vec<Address> {
        self.state
            .read()
            .await
            .addresses
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    async fn carriers(&self) -> Vec<Carrier> {
        self.state.read().await.carriers.clone()
    }

    async fn find_carrier(&self, carrier_id: CarrierId) -> Option<Carrier> {
        self.state
            .read()
            .await
            .carriers
            .iter()
            .find(|c| c.id == carrier_id)
            .cloned()
    }
}
