use catalog_store::StoreError;
use common::CatalogItemId;
use thiserror::Error;

use crate::outcome::WriteOperation;
use crate::services::NotifyFailure;

/// Errors returned by coordinated catalog writes.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The request was rejected before any side effect.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The item to update or delete does not exist.
    #[error("Catalog item not found: {0}")]
    NotFound(CatalogItemId),

    /// Inventory did not confirm and the local change was compensated.
    #[error("Inventory did not confirm {operation} of catalog item {item_id}: {reason}")]
    CompensatedFailure {
        operation: WriteOperation,
        item_id: CatalogItemId,
        reason: NotifyFailure,
    },

    /// Finalizing the local change failed after the remote outcome was known.
    ///
    /// The two services may disagree about this item.
    #[error("Failed to finalize {operation} of catalog item {item_id}: {source}")]
    FinalizeFailed {
        operation: WriteOperation,
        item_id: CatalogItemId,
        #[source]
        source: StoreError,
    },

    /// The caller cancelled the write before any side effect.
    #[error("Write cancelled")]
    Cancelled,

    /// The store failed before any side effect.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, WriteError>;
