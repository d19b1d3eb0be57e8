//! Inventory notifier port and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use common::CatalogItemId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The lifecycle event being mirrored to inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryEventKind {
    Create,
    Update,
    Delete,
}

impl InventoryEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryEventKind::Create => "create",
            InventoryEventKind::Update => "update",
            InventoryEventKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for InventoryEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event sent to the inventory service for one catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryNotification {
    pub kind: InventoryEventKind,
    pub catalog_item_id: CatalogItemId,
    /// Stock level, present for create and update only.
    pub quantity: Option<u32>,
}

impl InventoryNotification {
    pub fn create(catalog_item_id: CatalogItemId, initial_quantity: u32) -> Self {
        Self {
            kind: InventoryEventKind::Create,
            catalog_item_id,
            quantity: Some(initial_quantity),
        }
    }

    pub fn update(catalog_item_id: CatalogItemId, quantity: u32) -> Self {
        Self {
            kind: InventoryEventKind::Update,
            catalog_item_id,
            quantity: Some(quantity),
        }
    }

    pub fn delete(catalog_item_id: CatalogItemId) -> Self {
        Self {
            kind: InventoryEventKind::Delete,
            catalog_item_id,
            quantity: None,
        }
    }
}

/// Why the inventory side did not confirm a notification.
///
/// The coordinator routes every variant the same way; the distinction only
/// shows up in logs and error messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyFailure {
    #[error("inventory rejected the request: {0}")]
    Rejected(String),

    #[error("inventory unreachable: {0}")]
    Transport(String),

    #[error("inventory call timed out")]
    Timeout,

    #[error("inventory call cancelled")]
    Cancelled,
}

impl NotifyFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyFailure::Rejected(_) => "rejected",
            NotifyFailure::Transport(_) => "transport",
            NotifyFailure::Timeout => "timeout",
            NotifyFailure::Cancelled => "cancelled",
        }
    }
}

/// Result of one inventory notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Confirmed,
    Failed(NotifyFailure),
}

impl NotifyOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, NotifyOutcome::Confirmed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyOutcome::Confirmed => "confirmed",
            NotifyOutcome::Failed(failure) => failure.as_str(),
        }
    }
}

/// Outbound port to the inventory service.
///
/// Each call resolves to exactly one [`NotifyOutcome`]. Implementations must
/// return `Failed(Cancelled)` promptly once `cancel` fires, and never touch the
/// catalog store.
#[async_trait]
pub trait InventoryNotifier: Send + Sync {
    async fn notify(
        &self,
        notification: InventoryNotification,
        cancel: &CancellationToken,
    ) -> NotifyOutcome;
}

#[async_trait]
impl<T: InventoryNotifier + ?Sized> InventoryNotifier for Arc<T> {
    async fn notify(
        &self,
        notification: InventoryNotification,
        cancel: &CancellationToken,
    ) -> NotifyOutcome {
        (**self).notify(notification, cancel).await
    }
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    stock: HashMap<CatalogItemId, u32>,
    received: Vec<InventoryNotification>,
    failure: Option<NotifyFailure>,
    delay: Option<Duration>,
}

/// In-memory inventory service.
///
/// Confirms every notification unless told to fail, and mirrors the stock
/// level of each catalog item it was told about. Used for tests and for
/// running without a live inventory service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryNotifier {
    state: Arc<Mutex<InMemoryInventoryState>>,
}

impl InMemoryInventoryNotifier {
    /// Creates a notifier that confirms everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent notification fail with `failure`.
    pub fn fail_with(&self, failure: NotifyFailure) {
        self.lock().failure = Some(failure);
    }

    /// Makes subsequent notifications succeed again.
    pub fn succeed(&self) {
        self.lock().failure = None;
    }

    /// Delays every notification, honouring cancellation while waiting.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.lock().delay = delay;
    }

    /// Returns the mirrored stock level of an item, if inventory knows it.
    pub fn stock_for(&self, catalog_item_id: CatalogItemId) -> Option<u32> {
        self.lock().stock.get(&catalog_item_id).copied()
    }

    /// Returns the number of items inventory currently tracks.
    pub fn tracked_items(&self) -> usize {
        self.lock().stock.len()
    }

    /// Returns every notification received, in order.
    pub fn received(&self) -> Vec<InventoryNotification> {
        self.lock().received.clone()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryInventoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl InventoryNotifier for InMemoryInventoryNotifier {
    async fn notify(
        &self,
        notification: InventoryNotification,
        cancel: &CancellationToken,
    ) -> NotifyOutcome {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return NotifyOutcome::Failed(NotifyFailure::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
        if cancel.is_cancelled() {
            return NotifyOutcome::Failed(NotifyFailure::Cancelled);
        }

        let mut state = self.lock();
        state.received.push(notification.clone());

        if let Some(failure) = state.failure.clone() {
            return NotifyOutcome::Failed(failure);
        }

        let id = notification.catalog_item_id;
        match notification.kind {
            InventoryEventKind::Create | InventoryEventKind::Update => {
                state.stock.insert(id, notification.quantity.unwrap_or_default());
            }
            InventoryEventKind::Delete => {
                state.stock.remove(&id);
            }
        }

        NotifyOutcome::Confirmed
    }
}
