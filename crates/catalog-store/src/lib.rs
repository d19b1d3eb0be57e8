//! Transactional catalog store.
//!
//! Writes are staged inside an open transaction and handed back to the caller
//! as a [`PendingMutation`], which must be committed or rolled back once the
//! caller knows whether the change should survive. Dropping a pending mutation
//! without finalizing it releases its session and discards the change.

pub mod error;
pub mod memory;
pub mod model;
pub mod mutation;
pub mod postgres;
pub mod seed;
pub mod store;

pub use common::{CatalogBrandId, CatalogItemId, CatalogTypeId, Price};
pub use error::{Result, StoreError};
pub use memory::{InMemoryCatalogStore, InMemoryPendingMutation, InMemoryStoreConfig};
pub use model::{CatalogBrand, CatalogItem, CatalogType, NewCatalogItem};
pub use mutation::{MutationKind, MutationState, PendingMutation};
pub use postgres::{PgPendingMutation, PostgresCatalogStore, PostgresStoreConfig};
pub use store::{CatalogStore, CatalogStoreExt};
