//! The serialized desired-state reader contract.

use crate::error::StoreResult;
use arbor_model::{LiveNode, NodeId, SerializedItem, TreePath};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A reference to one unit of desired state on disk.
///
/// A reference is cheap: it knows its identity and path without reading
/// the full item. Materializing via [`item`](SerializedNode::item) reads
/// the complete description; `None` means the reference exists but the
/// backing data is missing on disk. Child references are enumerated fresh
/// on every call; implementations must not cache across traversals.
pub trait SerializedNode: Send + Sync {
    /// Stable identity of the referenced node.
    fn id(&self) -> NodeId;

    /// Owning store/partition name.
    fn partition(&self) -> &str;

    /// Logical path of the reference.
    fn path(&self) -> &TreePath;

    /// Materializes the full item description.
    fn item(&self) -> StoreResult<Option<SerializedItem>>;

    /// Enumerates child references in serialized order.
    fn children(&self) -> StoreResult<Vec<Arc<dyn SerializedNode>>>;
}

/// Reader contract for a serialized desired-state store.
pub trait SerializedStore: Send + Sync {
    /// Returns the root references of a partition in serialized order.
    fn roots(&self, partition: &str) -> StoreResult<Vec<Arc<dyn SerializedNode>>>;

    /// Returns the serialized reference corresponding to a live node, if
    /// the desired state describes it.
    fn reference_for(&self, node: &LiveNode) -> StoreResult<Option<Arc<dyn SerializedNode>>>;
}

struct RefMeta {
    partition: String,
    path: TreePath,
    parent: Option<NodeId>,
}

#[derive(Default)]
struct TreeInner {
    refs: HashMap<NodeId, RefMeta>,
    items: HashMap<NodeId, SerializedItem>,
    children: HashMap<NodeId, Vec<NodeId>>,
    roots: HashMap<String, Vec<NodeId>>,
}

/// An in-memory serialized desired-state store.
///
/// Suitable for unit and integration tests: the tree can be mutated
/// between reconciliation runs to simulate edits to the serialized state.
/// References read through to the shared tree on every call, so a run
/// always observes the current contents.
#[derive(Default)]
pub struct MemorySerializedTree {
    inner: Arc<RwLock<TreeInner>>,
}

impl MemorySerializedTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an item, attaching it under its serialized parent.
    ///
    /// If the parent reference is not present in the tree, the item
    /// becomes a root of its partition.
    pub fn insert(&self, item: SerializedItem) {
        let parent = if self.inner.read().refs.contains_key(&item.parent_id) {
            Some(item.parent_id)
        } else {
            None
        };
        self.insert_under(parent, item);
    }

    /// Inserts an item at an explicit position in the on-disk hierarchy.
    ///
    /// The structural parent may differ from the item's logical
    /// `parent_id`, which is how a move shows up on disk before the live
    /// tree catches up. `None` makes the item a root of its partition.
    pub fn insert_under(&self, structural_parent: Option<NodeId>, item: SerializedItem) {
        let mut inner = self.inner.write();
        match structural_parent {
            Some(parent_id) => {
                let siblings = inner.children.entry(parent_id).or_default();
                if !siblings.contains(&item.id) {
                    siblings.push(item.id);
                }
            }
            None => {
                let roots = inner.roots.entry(item.partition.clone()).or_default();
                if !roots.contains(&item.id) {
                    roots.push(item.id);
                }
            }
        }
        inner.refs.insert(
            item.id,
            RefMeta {
                partition: item.partition.clone(),
                path: item.path.clone(),
                parent: structural_parent,
            },
        );
        inner.items.insert(item.id, item);
    }

    /// Inserts a reference with no backing item (missing on disk).
    pub fn insert_reference(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        partition: impl Into<String>,
        path: TreePath,
    ) {
        let mut inner = self.inner.write();
        let partition = partition.into();
        match parent {
            Some(parent_id) => {
                let siblings = inner.children.entry(parent_id).or_default();
                if !siblings.contains(&id) {
                    siblings.push(id);
                }
            }
            None => {
                let roots = inner.roots.entry(partition.clone()).or_default();
                if !roots.contains(&id) {
                    roots.push(id);
                }
            }
        }
        inner.refs.insert(
            id,
            RefMeta {
                partition,
                path,
                parent,
            },
        );
    }

    /// Removes the backing item but keeps the reference, simulating data
    /// that is missing on disk.
    pub fn remove_item(&self, id: NodeId) {
        self.inner.write().items.remove(&id);
    }

    /// Removes a reference and its entire subtree from the desired state.
    pub fn remove_subtree(&self, id: NodeId) {
        let mut inner = self.inner.write();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(children) = inner.children.remove(&current) {
                pending.extend(children);
            }
            inner.items.remove(&current);
            if let Some(meta) = inner.refs.remove(&current) {
                match meta.parent {
                    Some(parent) => {
                        if let Some(siblings) = inner.children.get_mut(&parent) {
                            siblings.retain(|c| *c != current);
                        }
                    }
                    None => {
                        if let Some(roots) = inner.roots.get_mut(&meta.partition) {
                            roots.retain(|r| *r != current);
                        }
                    }
                }
            }
        }
    }

    /// Returns a reference handle for a node present in the tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<Arc<dyn SerializedNode>> {
        let inner = self.inner.read();
        inner.refs.get(&id).map(|meta| self.make_ref(id, meta))
    }

    fn make_ref(&self, id: NodeId, meta: &RefMeta) -> Arc<dyn SerializedNode> {
        Arc::new(MemoryRef {
            tree: Arc::clone(&self.inner),
            id,
            partition: meta.partition.clone(),
            path: meta.path.clone(),
        })
    }
}

impl SerializedStore for MemorySerializedTree {
    fn roots(&self, partition: &str) -> StoreResult<Vec<Arc<dyn SerializedNode>>> {
        let inner = self.inner.read();
        let ids = inner.roots.get(partition).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| inner.refs.get(&id).map(|meta| self.make_ref(id, meta)))
            .collect())
    }

    fn reference_for(&self, node: &LiveNode) -> StoreResult<Option<Arc<dyn SerializedNode>>> {
        let inner = self.inner.read();
        Ok(inner
            .refs
            .get(&node.id)
            .filter(|meta| meta.partition == node.partition)
            .map(|meta| self.make_ref(node.id, meta)))
    }
}

struct MemoryRef {
    tree: Arc<RwLock<TreeInner>>,
    id: NodeId,
    partition: String,
    path: TreePath,
}

impl SerializedNode for MemoryRef {
    fn id(&self) -> NodeId {
        self.id
    }

    fn partition(&self) -> &str {
        &self.partition
    }

    fn path(&self) -> &TreePath {
        &self.path
    }

    fn item(&self) -> StoreResult<Option<SerializedItem>> {
        Ok(self.tree.read().items.get(&self.id).cloned())
    }

    fn children(&self) -> StoreResult<Vec<Arc<dyn SerializedNode>>> {
        let inner = self.tree.read();
        let ids = inner.children.get(&self.id).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| {
                inner.refs.get(&id).map(|meta| {
                    Arc::new(MemoryRef {
                        tree: Arc::clone(&self.tree),
                        id,
                        partition: meta.partition.clone(),
                        path: meta.path.clone(),
                    }) as Arc<dyn SerializedNode>
                })
            })
            .collect())
    }
}
