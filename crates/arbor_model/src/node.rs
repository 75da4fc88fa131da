//! Live node snapshots.

use crate::field::FieldValue;
use crate::id::{FieldId, NodeId};
use crate::path::TreePath;
use crate::version::VersionKey;
use crate::well_known;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An immutable snapshot of one node in the live content store.
///
/// Snapshots are produced by the live-store adapter and become stale as
/// soon as the node is mutated; callers re-fetch after structural
/// operations. Identity-based lookup into the store remains the source of
/// truth; a snapshot is never written back wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveNode {
    /// Stable identity, unique within the partition.
    pub id: NodeId,
    /// Identity of the parent node; `None` for a partition root.
    pub parent_id: Option<NodeId>,
    /// Identity of the structural type (template).
    pub template_id: NodeId,
    /// Identity of the structural variant (branch), if any.
    pub branch_id: Option<NodeId>,
    /// Display name.
    pub name: String,
    /// Owning store/partition name.
    pub partition: String,
    /// Logical path within the partition, derived from the parent chain.
    pub path: TreePath,
    /// Shared (language-independent) field values.
    pub shared_fields: BTreeMap<FieldId, FieldValue>,
    /// Versions and their variant-scoped field values.
    pub versions: BTreeMap<VersionKey, BTreeMap<FieldId, FieldValue>>,
}

impl LiveNode {
    /// Returns the shared value for a field, if set.
    #[must_use]
    pub fn shared_value(&self, field: FieldId) -> Option<&FieldValue> {
        self.shared_fields.get(&field)
    }

    /// Returns the field values of one version, if the version exists.
    #[must_use]
    pub fn version_fields(&self, key: &VersionKey) -> Option<&BTreeMap<FieldId, FieldValue>> {
        self.versions.get(key)
    }

    /// Returns true if the node carries the given version.
    #[must_use]
    pub fn has_version(&self, key: &VersionKey) -> bool {
        self.versions.contains_key(key)
    }

    /// Returns the keys of all versions present on the node.
    #[must_use]
    pub fn version_keys(&self) -> Vec<VersionKey> {
        self.versions.keys().cloned().collect()
    }

    /// Returns true if this node is a structure-definition defaults record
    /// (a type's default-values child).
    #[must_use]
    pub fn is_defaults_record(&self) -> bool {
        well_known::is_defaults_name(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> LiveNode {
        LiveNode {
            id: NodeId::new(),
            parent_id: Some(NodeId::new()),
            template_id: NodeId::new(),
            branch_id: None,
            name: "home".into(),
            partition: "master".into(),
            path: TreePath::new("/site/home"),
            shared_fields: BTreeMap::new(),
            versions: BTreeMap::new(),
        }
    }

    #[test]
    fn version_queries() {
        let mut node = node();
        let key = VersionKey::new("en", 1);
        node.versions.insert(key.clone(), BTreeMap::new());

        assert!(node.has_version(&key));
        assert!(!node.has_version(&VersionKey::new("en", 2)));
        assert_eq!(node.version_keys(), vec![key]);
    }

    #[test]
    fn defaults_record_detection() {
        let mut node = node();
        assert!(!node.is_defaults_record());
        node.name = "__Defaults".into();
        assert!(node.is_defaults_record());
    }
}
