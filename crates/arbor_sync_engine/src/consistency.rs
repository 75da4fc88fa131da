//! Consistency checking across the items seen in one run.

use crate::error::{SyncError, SyncResult};
use arbor_model::{NodeId, SerializedItem, TreePath};
use std::collections::HashMap;

/// Stateful collaborator invoked before every item load.
///
/// A checker accumulates state across the items of one run and rejects an
/// item that violates an invariant against what it has already seen.
/// Rejection is fatal for the entire run. A fresh checker is created per
/// run; the retry replay pass runs without one, since replayed items were
/// already recorded on their first attempt.
pub trait ConsistencyChecker: Send {
    /// Checks `item` against the items seen so far and records it as
    /// processed.
    fn check(&mut self, item: &SerializedItem) -> SyncResult<()>;
}

/// Detects the same identity appearing more than once within a partition
/// in a single run.
#[derive(Debug, Default)]
pub struct DuplicateIdChecker {
    seen: HashMap<(String, NodeId), TreePath>,
}

impl DuplicateIdChecker {
    /// Creates an empty checker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of items recorded so far.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

impl ConsistencyChecker for DuplicateIdChecker {
    fn check(&mut self, item: &SerializedItem) -> SyncResult<()> {
        let key = (item.partition.clone(), item.id);
        if let Some(first_path) = self.seen.get(&key) {
            return Err(SyncError::consistency_violation(
                item.id,
                item.path.clone(),
                format!("identity already seen at {first_path}"),
            ));
        }
        self.seen.insert(key, item.path.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: NodeId, partition: &str, path: &str) -> SerializedItem {
        SerializedItem {
            id,
            parent_id: NodeId::new(),
            template_id: NodeId::new(),
            branch_id: None,
            name: TreePath::new(path).leaf().to_string(),
            partition: partition.into(),
            path: TreePath::new(path),
            shared_fields: Vec::new(),
            versions: Vec::new(),
        }
    }

    #[test]
    fn distinct_ids_pass() {
        let mut checker = DuplicateIdChecker::new();
        checker.check(&item(NodeId::new(), "master", "/a")).unwrap();
        checker.check(&item(NodeId::new(), "master", "/b")).unwrap();
        assert_eq!(checker.seen_count(), 2);
    }

    #[test]
    fn duplicate_id_is_a_violation() {
        let mut checker = DuplicateIdChecker::new();
        let id = NodeId::new();
        checker.check(&item(id, "master", "/a")).unwrap();

        let err = checker.check(&item(id, "master", "/b")).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("/a"));
    }

    #[test]
    fn same_id_in_another_partition_passes() {
        let mut checker = DuplicateIdChecker::new();
        let id = NodeId::new();
        checker.check(&item(id, "master", "/a")).unwrap();
        checker.check(&item(id, "web", "/a")).unwrap();
    }
}
