use serde::{Deserialize, Serialize};

use crate::services::NotifyFailure;

/// The coordinated write being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOperation {
    Create,
    Update,
    Delete,
}

impl WriteOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOperation::Create => "create",
            WriteOperation::Update => "update",
            WriteOperation::Delete => "delete",
        }
    }
}

impl std::fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a delete that reached the local commit.
///
/// The local row is gone in both cases. `PartialFailure` means inventory did
/// not confirm and may still track the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Confirmed,
    PartialFailure(NotifyFailure),
}

impl DeleteOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, DeleteOutcome::Confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(WriteOperation::Create.to_string(), "create");
        assert_eq!(WriteOperation::Delete.as_str(), "delete");
    }

    #[test]
    fn test_delete_outcome_confirmed() {
        assert!(DeleteOutcome::Confirmed.is_confirmed());
        assert!(!DeleteOutcome::PartialFailure(NotifyFailure::Timeout).is_confirmed());
    }
}
