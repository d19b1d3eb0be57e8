//! Outbound inventory integration.

mod http;
mod inventory;

pub use http::{HttpInventoryNotifier, HttpNotifierConfig};
pub use inventory::{
    InMemoryInventoryNotifier, InventoryEventKind, InventoryNotification, InventoryNotifier,
    NotifyFailure, NotifyOutcome,
};
