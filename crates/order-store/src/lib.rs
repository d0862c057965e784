pub mod error;
pub mod memory;
pub mod postgres;

pub use domain::{OrderRepository, RepositoryError, RepositoryResult};
pub use error::{OrderStoreError, Result};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
