use thiserror::Error;

use crate::CatalogItemId;
use crate::mutation::{MutationKind, MutationState};

/// Errors that can occur when interacting with the catalog store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No catalog item matches the given id.
    #[error("Catalog item not found: {0}")]
    ItemNotFound(CatalogItemId),

    /// The pending mutation was already finalized the other way.
    #[error("Pending {kind} of catalog item {item_id} is already {state}")]
    AlreadyFinalized {
        item_id: CatalogItemId,
        kind: MutationKind,
        state: MutationState,
    },

    /// Applying a staged change failed.
    #[error("Failed to commit {kind} of catalog item {item_id}: {reason}")]
    CommitFailed {
        item_id: CatalogItemId,
        kind: MutationKind,
        reason: String,
    },

    /// No session could be acquired.
    #[error("Catalog store unavailable: {0}")]
    Unavailable(String),

    /// The identity counter cannot allocate another item id.
    #[error("Catalog item identity space exhausted")]
    IdentityExhausted,

    /// A stored row violates a value object invariant.
    #[error("Invalid catalog row: {0}")]
    InvalidRow(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for catalog store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
