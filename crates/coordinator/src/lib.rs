//! Cross-service write coordination for the catalog.
//!
//! Every catalog write must be mirrored by the inventory service. The
//! [`CatalogWriteCoordinator`] stages the local change, notifies inventory and
//! then commits or compensates based on the outcome:
//!
//! - **create**: stage insert, notify, commit on confirmation, roll back otherwise
//! - **update**: notify first, stage and commit only on confirmation
//! - **delete**: notify, then delete locally whatever the outcome
//!
//! Create and update never leave a local change behind after an inventory
//! failure. Delete always applies locally and reports an unconfirmed inventory
//! side as [`DeleteOutcome::PartialFailure`] instead of an error.

pub mod coordinator;
pub mod error;
pub mod outcome;
pub mod request;
pub mod services;

pub use coordinator::{CatalogWriteCoordinator, CoordinatorConfig};
pub use error::WriteError;
pub use outcome::{DeleteOutcome, WriteOperation};
pub use request::{CreateCatalogItem, UpdateCatalogItem};
pub use services::{
    HttpInventoryNotifier, HttpNotifierConfig, InMemoryInventoryNotifier, InventoryEventKind,
    InventoryNotification, InventoryNotifier, NotifyFailure, NotifyOutcome,
};
