//! Pending mutation handle and its lifecycle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{CatalogItemId, Result};

/// The kind of change a pending mutation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Insert => "insert",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The state of a pending mutation in its lifecycle.
///
/// State transitions:
/// ```text
/// Staged ──┬──► Committed
///          ├──► RolledBack
///          └──► Abandoned
/// ```
///
/// `Abandoned` means the session was released without a confirmed outcome,
/// for example when the commit itself failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MutationState {
    /// The change is applied to an open transaction.
    #[default]
    Staged,

    /// The change is durable (terminal state).
    Committed,

    /// The change was discarded (terminal state).
    RolledBack,

    /// The session is gone and the outcome is unknown (terminal state).
    Abandoned,
}

impl MutationState {
    /// Returns true if the mutation can still be committed or rolled back.
    pub fn can_finalize(&self) -> bool {
        matches!(self, MutationState::Staged)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !self.can_finalize()
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationState::Staged => "staged",
            MutationState::Committed => "committed",
            MutationState::RolledBack => "rolled back",
            MutationState::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for MutationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A local change applied to a not-yet-committed transaction.
///
/// The handle holds an exclusive claim on one connection or session, which is
/// released exactly once: by `commit`, by `rollback`, or by drop. Repeating the
/// call that finalized the mutation is a no-op; finalizing it the other way
/// fails with [`StoreError::AlreadyFinalized`](crate::StoreError::AlreadyFinalized).
#[async_trait]
pub trait PendingMutation: Send {
    /// The kind of staged change.
    fn kind(&self) -> MutationKind;

    /// The item the change applies to.
    fn item_id(&self) -> CatalogItemId;

    /// Current lifecycle state.
    fn state(&self) -> MutationState;

    /// Durably applies the staged change and releases the session.
    async fn commit(&mut self) -> Result<()>;

    /// Discards the staged change and releases the session.
    async fn rollback(&mut self) -> Result<()>;
}

pub(crate) fn record_finalized(kind: MutationKind, state: MutationState) {
    metrics::counter!(
        "catalog_store_mutations_total",
        "kind" => kind.as_str(),
        "state" => state.as_str()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_staged() {
        assert_eq!(MutationState::default(), MutationState::Staged);
    }

    #[test]
    fn test_only_staged_can_finalize() {
        assert!(MutationState::Staged.can_finalize());
        assert!(!MutationState::Committed.can_finalize());
        assert!(!MutationState::RolledBack.can_finalize());
        assert!(!MutationState::Abandoned.can_finalize());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!MutationState::Staged.is_terminal());
        assert!(MutationState::Committed.is_terminal());
        assert!(MutationState::RolledBack.is_terminal());
        assert!(MutationState::Abandoned.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(MutationState::RolledBack.to_string(), "rolled back");
        assert_eq!(MutationKind::Insert.to_string(), "insert");
    }
}
