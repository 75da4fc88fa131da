//! Orphan candidate tracking for one tree level.

use arbor_model::{LiveNode, NodeId};
use std::collections::BTreeMap;

/// The orphan candidate set of one tree level.
///
/// Every in-scope live child is added speculatively; candidates are
/// removed as soon as a matching serialized child is found, a child is
/// skipped, or a failure prevents a safe judgment. Removal always precedes
/// [`commit`](OrphanSet::commit), so an identity is never both matched and
/// reported as an orphan.
#[derive(Debug, Default)]
pub struct OrphanSet {
    candidates: BTreeMap<NodeId, LiveNode>,
}

impl OrphanSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a live node as a speculative orphan candidate.
    pub fn insert(&mut self, node: LiveNode) {
        self.candidates.insert(node.id, node);
    }

    /// Removes a candidate, if present.
    pub fn remove(&mut self, id: NodeId) -> Option<LiveNode> {
        self.candidates.remove(&id)
    }

    /// Returns true if no candidates remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Returns the number of remaining candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Commits the final candidate set, consuming the tracker.
    #[must_use]
    pub fn commit(self) -> Vec<LiveNode> {
        self.candidates.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_model::TreePath;

    fn node(id: NodeId) -> LiveNode {
        LiveNode {
            id,
            parent_id: None,
            template_id: NodeId::new(),
            branch_id: None,
            name: "n".into(),
            partition: "master".into(),
            path: TreePath::new("/n"),
            shared_fields: Default::default(),
            versions: Default::default(),
        }
    }

    #[test]
    fn removal_precedes_commit() {
        let mut set = OrphanSet::new();
        let kept = NodeId::new();
        let matched = NodeId::new();
        set.insert(node(kept));
        set.insert(node(matched));

        assert!(set.remove(matched).is_some());
        assert!(set.remove(matched).is_none());

        let committed = set.commit();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].id, kept);
    }

    #[test]
    fn reinsert_overwrites() {
        let mut set = OrphanSet::new();
        let id = NodeId::new();
        set.insert(node(id));
        set.insert(node(id));
        assert_eq!(set.len(), 1);
    }
}
