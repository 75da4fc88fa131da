//! Serialized item records.

use crate::field::FieldDescriptor;
use crate::id::{FieldId, NodeId};
use crate::path::TreePath;
use crate::version::VersionKey;
use serde::{Deserialize, Serialize};

/// One version of a serialized item: a version key plus the field
/// descriptors scoped to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedVersion {
    /// The language/revision this version describes.
    pub key: VersionKey,
    /// Field descriptors scoped to this version.
    pub fields: Vec<FieldDescriptor>,
}

impl SerializedVersion {
    /// Creates an empty version.
    #[must_use]
    pub fn new(key: VersionKey) -> Self {
        Self {
            key,
            fields: Vec::new(),
        }
    }

    /// Returns the descriptor for a field, if present.
    #[must_use]
    pub fn field(&self, field: FieldId) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|d| d.field == field)
    }

    /// Returns true if this version supplies a value for `field`.
    #[must_use]
    pub fn supplies(&self, field: FieldId) -> bool {
        self.field(field).is_some()
    }
}

/// The fully materialized desired state for one content node.
///
/// A `SerializedItem` is produced by the serialization reader when a node
/// reference is materialized. It is immutable once read; the reader
/// re-reads fresh on every traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedItem {
    /// Stable identity, shared with the live counterpart.
    pub id: NodeId,
    /// Identity of the desired parent node.
    pub parent_id: NodeId,
    /// Identity of the structural type (template).
    pub template_id: NodeId,
    /// Identity of the structural variant (branch), if any.
    pub branch_id: Option<NodeId>,
    /// Display name.
    pub name: String,
    /// Owning store/partition name.
    pub partition: String,
    /// Logical path within the partition.
    pub path: TreePath,
    /// Shared (language-independent) field descriptors.
    pub shared_fields: Vec<FieldDescriptor>,
    /// Versions and their variant-scoped field descriptors.
    pub versions: Vec<SerializedVersion>,
}

impl SerializedItem {
    /// Returns the shared descriptor for a field, if present.
    #[must_use]
    pub fn shared_field(&self, field: FieldId) -> Option<&FieldDescriptor> {
        self.shared_fields.iter().find(|d| d.field == field)
    }

    /// Returns true if the item supplies a shared value for `field`.
    #[must_use]
    pub fn supplies_shared(&self, field: FieldId) -> bool {
        self.shared_field(field).is_some()
    }

    /// Returns the version with the given key, if present.
    #[must_use]
    pub fn version(&self, key: &VersionKey) -> Option<&SerializedVersion> {
        self.versions.iter().find(|v| &v.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDescriptor;

    fn item_with_version() -> SerializedItem {
        let field = FieldId::new();
        let mut version = SerializedVersion::new(VersionKey::new("en", 1));
        version.fields.push(FieldDescriptor::versioned(field, "v"));
        SerializedItem {
            id: NodeId::new(),
            parent_id: NodeId::new(),
            template_id: NodeId::new(),
            branch_id: None,
            name: "home".into(),
            partition: "master".into(),
            path: TreePath::new("/site/home"),
            shared_fields: vec![FieldDescriptor::shared(field, "s")],
            versions: vec![version],
        }
    }

    #[test]
    fn field_lookup() {
        let item = item_with_version();
        let field = item.shared_fields[0].field;
        assert!(item.supplies_shared(field));
        assert!(item.shared_field(FieldId::new()).is_none());
    }

    #[test]
    fn version_lookup() {
        let item = item_with_version();
        assert!(item.version(&VersionKey::new("en", 1)).is_some());
        assert!(item.version(&VersionKey::new("en", 2)).is_none());

        let version = item.version(&VersionKey::new("en", 1)).unwrap();
        let field = version.fields[0].field;
        assert!(version.supplies(field));
    }
}
