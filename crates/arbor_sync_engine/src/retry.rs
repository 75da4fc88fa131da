//! Deferred retry queue for failed reconciliation operations.

use crate::error::SyncError;
use arbor_model::NodeId;
use arbor_store::SerializedNode;
use std::fmt;
use std::sync::Arc;

/// An isolated single-item failure, replayed by direct reconciliation.
pub struct ItemFailure {
    /// The serialized reference that failed.
    pub node: Arc<dyn SerializedNode>,
    /// The failure that was captured.
    pub error: SyncError,
}

/// A failure that aborted a whole subtree walk, replayed by a full
/// recursive re-walk of the subtree.
pub struct TreeFailure {
    /// The serialized reference whose subtree failed.
    pub node: Arc<dyn SerializedNode>,
    /// The failure that was captured.
    pub error: SyncError,
}

/// A structure-definition record deferred until the rest of its tree
/// level has been reconciled.
pub struct PrerequisiteEntry {
    /// Identity of the level owner (the parent whose children were being
    /// loaded when the entry was queued).
    pub level: NodeId,
    /// The deferred serialized reference.
    pub node: Arc<dyn SerializedNode>,
}

/// Holds failed per-item and per-subtree operations for deferred replay.
///
/// Entries accumulate during the walk and are consumed exactly once:
/// structural prerequisites are taken back per tree level as each level
/// completes, item- and tree-level failures are drained for the single
/// deferred replay pass after the full walk. An entry that fails its
/// replay is surfaced through the logger, not re-queued.
#[derive(Default)]
pub struct RetryQueue {
    items: Vec<ItemFailure>,
    trees: Vec<TreeFailure>,
    prerequisites: Vec<PrerequisiteEntry>,
}

impl RetryQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an isolated single-item failure.
    pub fn push_item(&mut self, node: Arc<dyn SerializedNode>, error: SyncError) {
        self.items.push(ItemFailure { node, error });
    }

    /// Queues a whole-subtree failure.
    pub fn push_tree(&mut self, node: Arc<dyn SerializedNode>, error: SyncError) {
        self.trees.push(TreeFailure { node, error });
    }

    /// Queues a structure-definition record for replay after its level.
    pub fn push_prerequisite(&mut self, level: NodeId, node: Arc<dyn SerializedNode>) {
        self.prerequisites.push(PrerequisiteEntry { level, node });
    }

    /// Takes back the prerequisite entries scoped to one tree level.
    pub fn take_prerequisites(&mut self, level: NodeId) -> Vec<PrerequisiteEntry> {
        let mut taken = Vec::new();
        let mut remaining = Vec::with_capacity(self.prerequisites.len());
        for entry in self.prerequisites.drain(..) {
            if entry.level == level {
                taken.push(entry);
            } else {
                remaining.push(entry);
            }
        }
        self.prerequisites = remaining;
        taken
    }

    /// Returns true if no entries of any class remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.trees.is_empty() && self.prerequisites.is_empty()
    }

    /// Returns the total number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len() + self.trees.len() + self.prerequisites.len()
    }

    /// Drains all entries for the deferred replay pass.
    pub fn drain(
        &mut self,
    ) -> (
        Vec<ItemFailure>,
        Vec<TreeFailure>,
        Vec<PrerequisiteEntry>,
    ) {
        (
            std::mem::take(&mut self.items),
            std::mem::take(&mut self.trees),
            std::mem::take(&mut self.prerequisites),
        )
    }
}

impl fmt::Debug for RetryQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryQueue")
            .field("items", &self.items.len())
            .field("trees", &self.trees.len())
            .field("prerequisites", &self.prerequisites.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_model::{SerializedItem, TreePath};
    use arbor_store::{StoreError, StoreResult};

    struct StubNode {
        id: NodeId,
        path: TreePath,
    }

    impl SerializedNode for StubNode {
        fn id(&self) -> NodeId {
            self.id
        }

        fn partition(&self) -> &str {
            "master"
        }

        fn path(&self) -> &TreePath {
            &self.path
        }

        fn item(&self) -> StoreResult<Option<SerializedItem>> {
            Ok(None)
        }

        fn children(&self) -> StoreResult<Vec<Arc<dyn SerializedNode>>> {
            Ok(Vec::new())
        }
    }

    fn stub(path: &str) -> Arc<dyn SerializedNode> {
        Arc::new(StubNode {
            id: NodeId::new(),
            path: TreePath::new(path),
        })
    }

    fn error() -> SyncError {
        SyncError::Store(StoreError::unknown_partition("master"))
    }

    #[test]
    fn push_and_drain() {
        let mut queue = RetryQueue::new();
        assert!(queue.is_empty());

        queue.push_item(stub("/a"), error());
        queue.push_tree(stub("/b"), error());
        queue.push_prerequisite(NodeId::new(), stub("/c"));
        assert_eq!(queue.len(), 3);

        let (items, trees, prerequisites) = queue.drain();
        assert_eq!(items.len(), 1);
        assert_eq!(trees.len(), 1);
        assert_eq!(prerequisites.len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn prerequisites_are_scoped_by_level() {
        let mut queue = RetryQueue::new();
        let level_a = NodeId::new();
        let level_b = NodeId::new();
        queue.push_prerequisite(level_a, stub("/a/__defaults"));
        queue.push_prerequisite(level_b, stub("/b/__defaults"));
        queue.push_prerequisite(level_a, stub("/a/other/__defaults"));

        let taken = queue.take_prerequisites(level_a);
        assert_eq!(taken.len(), 2);
        assert_eq!(queue.len(), 1);

        let rest = queue.take_prerequisites(level_b);
        assert_eq!(rest.len(), 1);
        assert!(queue.is_empty());
    }
}
