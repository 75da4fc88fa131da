//! In-memory live content store.

use crate::change_feed::{ChangeEvent, ChangeFeed, ChangeKind};
use crate::error::{StoreError, StoreResult};
use crate::guard::{FeedbackGuard, NotificationsGuard};
use crate::live::LiveStore;
use arbor_model::{
    well_known, FieldId, FieldScope, FieldValue, LiveNode, NodeId, TemplateDef, TreePath,
    VersionKey,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct StoredNode {
    parent_id: Option<NodeId>,
    template_id: NodeId,
    branch_id: Option<NodeId>,
    name: String,
    children: Vec<NodeId>,
    shared: BTreeMap<FieldId, FieldValue>,
    versions: BTreeMap<VersionKey, BTreeMap<FieldId, FieldValue>>,
}

#[derive(Default)]
struct Partition {
    nodes: HashMap<NodeId, StoredNode>,
    templates: HashMap<NodeId, TemplateDef>,
}

#[derive(Default)]
struct Inner {
    partitions: HashMap<String, Partition>,
}

/// An in-memory live content store.
///
/// This store is the reference implementation of [`LiveStore`], suitable
/// for unit tests, integration tests, and ephemeral embedding.
///
/// # Snapshot cache
///
/// Reads through [`node`](LiveStore::node) populate a snapshot cache.
/// Mutations deliberately do **not** refresh it: during a reconciliation
/// run mutations bypass the standard notification paths, so cached
/// snapshots go stale until the caller invalidates them explicitly. This
/// mirrors the contract the reconciliation engine is written against.
pub struct MemoryLiveStore {
    inner: RwLock<Inner>,
    cache: RwLock<HashMap<(String, NodeId), LiveNode>>,
    feedback: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    feed: ChangeFeed,
    completed: RwLock<Vec<String>>,
}

impl MemoryLiveStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            cache: RwLock::new(HashMap::new()),
            feedback: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            feed: ChangeFeed::new(),
            completed: RwLock::new(Vec::new()),
        }
    }

    /// Creates a partition if it does not exist yet.
    pub fn create_partition(&self, name: impl Into<String>) {
        self.inner
            .write()
            .partitions
            .entry(name.into())
            .or_default();
    }

    /// Registers a template definition in a partition.
    pub fn insert_template(&self, partition: &str, template: TemplateDef) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let partition = inner
            .partitions
            .get_mut(partition)
            .ok_or_else(|| StoreError::unknown_partition(partition))?;
        partition.templates.insert(template.id, template);
        Ok(())
    }

    /// Creates a parentless root node in a partition.
    ///
    /// Roots are the anchors everything else hangs under; they carry no
    /// seeded versions.
    pub fn seed_root(
        &self,
        partition: &str,
        id: NodeId,
        name: &str,
        template: NodeId,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let part = inner
            .partitions
            .get_mut(partition)
            .ok_or_else(|| StoreError::unknown_partition(partition))?;
        if part.nodes.contains_key(&id) {
            return Err(StoreError::invalid_operation(format!(
                "node {id} already exists in partition {partition}"
            )));
        }
        part.nodes.insert(
            id,
            StoredNode {
                parent_id: None,
                template_id: template,
                branch_id: None,
                name: name.to_string(),
                children: Vec::new(),
                shared: BTreeMap::new(),
                versions: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Removes a template definition from a partition.
    ///
    /// Nodes of the removed type keep their type identity; it simply no
    /// longer resolves.
    pub fn remove_template(&self, partition: &str, id: NodeId) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let partition = inner
            .partitions
            .get_mut(partition)
            .ok_or_else(|| StoreError::unknown_partition(partition))?;
        partition.templates.remove(&id);
        Ok(())
    }

    /// Returns the change feed.
    #[must_use]
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Returns the partitions for which deserialization has completed, in
    /// signal order.
    #[must_use]
    pub fn completed_partitions(&self) -> Vec<String> {
        self.completed.read().clone()
    }

    /// Returns true if a snapshot for the node is currently cached.
    #[must_use]
    pub fn is_cached(&self, partition: &str, id: NodeId) -> bool {
        self.cache
            .read()
            .contains_key(&(partition.to_string(), id))
    }

    fn emit(&self, event: ChangeEvent) {
        if self.paused.load(Ordering::SeqCst) {
            return;
        }
        let stamped = event.stamped(self.feedback.load(Ordering::SeqCst));
        self.feed.emit(stamped);
    }

    fn snapshot(partition_name: &str, partition: &Partition, id: NodeId) -> StoreResult<LiveNode> {
        let stored = partition
            .nodes
            .get(&id)
            .ok_or_else(|| StoreError::node_not_found(partition_name, id))?;

        let mut segments = vec![stored.name.clone()];
        let mut current = stored.parent_id;
        while let Some(parent_id) = current {
            let parent = partition
                .nodes
                .get(&parent_id)
                .ok_or_else(|| StoreError::node_not_found(partition_name, parent_id))?;
            segments.push(parent.name.clone());
            current = parent.parent_id;
        }
        segments.reverse();
        let path = TreePath::new(segments.join("/"));

        Ok(LiveNode {
            id,
            parent_id: stored.parent_id,
            template_id: stored.template_id,
            branch_id: stored.branch_id,
            name: stored.name.clone(),
            partition: partition_name.to_string(),
            path,
            shared_fields: stored.shared.clone(),
            versions: stored.versions.clone(),
        })
    }

    fn with_partition<T>(
        &self,
        partition: &str,
        f: impl FnOnce(&Partition) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let inner = self.inner.read();
        let part = inner
            .partitions
            .get(partition)
            .ok_or_else(|| StoreError::unknown_partition(partition))?;
        f(part)
    }

    fn with_partition_mut<T>(
        &self,
        partition: &str,
        f: impl FnOnce(&mut Partition) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut inner = self.inner.write();
        let part = inner
            .partitions
            .get_mut(partition)
            .ok_or_else(|| StoreError::unknown_partition(partition))?;
        f(part)
    }
}

impl Default for MemoryLiveStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveStore for MemoryLiveStore {
    fn node(&self, partition: &str, id: NodeId) -> StoreResult<Option<LiveNode>> {
        let key = (partition.to_string(), id);
        if let Some(cached) = self.cache.read().get(&key) {
            return Ok(Some(cached.clone()));
        }

        let snapshot = self.with_partition(partition, |part| {
            if part.nodes.contains_key(&id) {
                Self::snapshot(partition, part, id).map(Some)
            } else {
                Ok(None)
            }
        })?;

        if let Some(ref node) = snapshot {
            self.cache.write().insert(key, node.clone());
        }
        Ok(snapshot)
    }

    fn children(&self, partition: &str, id: NodeId) -> StoreResult<Vec<LiveNode>> {
        self.with_partition(partition, |part| {
            let stored = part
                .nodes
                .get(&id)
                .ok_or_else(|| StoreError::node_not_found(partition, id))?;
            stored
                .children
                .iter()
                .map(|child| Self::snapshot(partition, part, *child))
                .collect()
        })
    }

    fn template(&self, partition: &str, id: NodeId) -> StoreResult<Option<TemplateDef>> {
        self.with_partition(partition, |part| Ok(part.templates.get(&id).cloned()))
    }

    fn create_node(
        &self,
        partition: &str,
        parent: NodeId,
        id: NodeId,
        name: &str,
        template: NodeId,
    ) -> StoreResult<()> {
        self.with_partition_mut(partition, |part| {
            if part.nodes.contains_key(&id) {
                return Err(StoreError::invalid_operation(format!(
                    "node {id} already exists in partition {partition}"
                )));
            }
            if !part.nodes.contains_key(&parent) {
                return Err(StoreError::node_not_found(partition, parent));
            }
            let def = part
                .templates
                .get(&template)
                .ok_or_else(|| StoreError::template_not_found(partition, template))?;

            // Seed template defaults: shared values directly, versioned
            // values onto an initial version.
            let mut shared = BTreeMap::new();
            let mut initial = BTreeMap::new();
            for (field, field_def) in &def.fields {
                if let Some(default) = &field_def.default {
                    match field_def.scope {
                        FieldScope::Shared => {
                            shared.insert(*field, default.clone());
                        }
                        FieldScope::Versioned => {
                            initial.insert(*field, default.clone());
                        }
                    }
                }
            }
            let mut versions = BTreeMap::new();
            versions.insert(VersionKey::new(well_known::INITIAL_LANGUAGE, 1), initial);

            part.nodes.insert(
                id,
                StoredNode {
                    parent_id: Some(parent),
                    template_id: template,
                    branch_id: None,
                    name: name.to_string(),
                    children: Vec::new(),
                    shared,
                    versions,
                },
            );
            if let Some(parent_node) = part.nodes.get_mut(&parent) {
                parent_node.children.push(id);
            }
            Ok(())
        })?;
        self.emit(ChangeEvent::node(partition, id, ChangeKind::Created));
        Ok(())
    }

    fn delete_node(&self, partition: &str, id: NodeId) -> StoreResult<()> {
        let deleted = self.with_partition_mut(partition, |part| {
            let stored = part
                .nodes
                .get(&id)
                .ok_or_else(|| StoreError::node_not_found(partition, id))?;
            if let Some(parent_id) = stored.parent_id {
                if let Some(parent) = part.nodes.get_mut(&parent_id) {
                    parent.children.retain(|c| *c != id);
                }
            }

            let mut deleted = Vec::new();
            let mut pending = vec![id];
            while let Some(current) = pending.pop() {
                if let Some(node) = part.nodes.remove(&current) {
                    pending.extend(node.children);
                    deleted.push(current);
                }
            }
            Ok(deleted)
        })?;
        for node_id in deleted {
            self.emit(ChangeEvent::node(partition, node_id, ChangeKind::Deleted));
        }
        Ok(())
    }

    fn move_node(&self, partition: &str, id: NodeId, new_parent: NodeId) -> StoreResult<()> {
        self.with_partition_mut(partition, |part| {
            if !part.nodes.contains_key(&id) {
                return Err(StoreError::node_not_found(partition, id));
            }
            if !part.nodes.contains_key(&new_parent) {
                return Err(StoreError::node_not_found(partition, new_parent));
            }

            // Reject moves under the node itself or its descendants.
            let mut current = Some(new_parent);
            while let Some(ancestor) = current {
                if ancestor == id {
                    return Err(StoreError::invalid_operation(format!(
                        "cannot move {id} under its own subtree"
                    )));
                }
                current = part.nodes.get(&ancestor).and_then(|n| n.parent_id);
            }

            let old_parent = part.nodes.get(&id).and_then(|n| n.parent_id);
            if let Some(old_parent_id) = old_parent {
                if let Some(old_parent_node) = part.nodes.get_mut(&old_parent_id) {
                    old_parent_node.children.retain(|c| *c != id);
                }
            }
            if let Some(new_parent_node) = part.nodes.get_mut(&new_parent) {
                new_parent_node.children.push(id);
            }
            if let Some(node) = part.nodes.get_mut(&id) {
                node.parent_id = Some(new_parent);
            }
            Ok(())
        })?;
        self.emit(ChangeEvent::node(partition, id, ChangeKind::Moved));
        Ok(())
    }

    fn rename_node(&self, partition: &str, id: NodeId, name: &str) -> StoreResult<()> {
        self.with_partition_mut(partition, |part| {
            let node = part
                .nodes
                .get_mut(&id)
                .ok_or_else(|| StoreError::node_not_found(partition, id))?;
            node.name = name.to_string();
            Ok(())
        })?;
        self.emit(ChangeEvent::node(partition, id, ChangeKind::Renamed));
        Ok(())
    }

    fn set_branch(&self, partition: &str, id: NodeId, branch: Option<NodeId>) -> StoreResult<()> {
        self.with_partition_mut(partition, |part| {
            let node = part
                .nodes
                .get_mut(&id)
                .ok_or_else(|| StoreError::node_not_found(partition, id))?;
            node.branch_id = branch;
            Ok(())
        })?;
        self.emit(ChangeEvent::node(partition, id, ChangeKind::BranchChanged));
        Ok(())
    }

    fn change_template(&self, partition: &str, id: NodeId, template: NodeId) -> StoreResult<()> {
        self.with_partition_mut(partition, |part| {
            if !part.templates.contains_key(&template) {
                return Err(StoreError::template_not_found(partition, template));
            }
            let node = part
                .nodes
                .get_mut(&id)
                .ok_or_else(|| StoreError::node_not_found(partition, id))?;
            node.template_id = template;
            Ok(())
        })?;
        self.emit(ChangeEvent::node(partition, id, ChangeKind::Retemplated));
        Ok(())
    }

    fn add_version(&self, partition: &str, id: NodeId, key: &VersionKey) -> StoreResult<()> {
        self.with_partition_mut(partition, |part| {
            let node = part
                .nodes
                .get_mut(&id)
                .ok_or_else(|| StoreError::node_not_found(partition, id))?;
            if node.versions.contains_key(key) {
                return Err(StoreError::invalid_operation(format!(
                    "version {key} already exists on node {id}"
                )));
            }
            node.versions.insert(key.clone(), BTreeMap::new());
            Ok(())
        })?;
        self.emit(
            ChangeEvent::node(partition, id, ChangeKind::VersionAdded).with_version(key.clone()),
        );
        Ok(())
    }

    fn remove_version(&self, partition: &str, id: NodeId, key: &VersionKey) -> StoreResult<()> {
        self.with_partition_mut(partition, |part| {
            let node = part
                .nodes
                .get_mut(&id)
                .ok_or_else(|| StoreError::node_not_found(partition, id))?;
            if node.versions.remove(key).is_none() {
                return Err(StoreError::VersionNotFound {
                    id,
                    version: key.clone(),
                });
            }
            Ok(())
        })?;
        self.emit(
            ChangeEvent::node(partition, id, ChangeKind::VersionRemoved).with_version(key.clone()),
        );
        Ok(())
    }

    fn write_shared_field(
        &self,
        partition: &str,
        id: NodeId,
        field: FieldId,
        value: FieldValue,
    ) -> StoreResult<()> {
        self.with_partition_mut(partition, |part| {
            let node = part
                .nodes
                .get_mut(&id)
                .ok_or_else(|| StoreError::node_not_found(partition, id))?;
            node.shared.insert(field, value);
            Ok(())
        })?;
        self.emit(ChangeEvent::node(partition, id, ChangeKind::FieldWritten).with_field(field));
        Ok(())
    }

    fn reset_shared_field(&self, partition: &str, id: NodeId, field: FieldId) -> StoreResult<()> {
        let changed = self.with_partition_mut(partition, |part| {
            let default = part
                .nodes
                .get(&id)
                .and_then(|n| part.templates.get(&n.template_id))
                .and_then(|t| t.default_for(field).cloned());
            let node = part
                .nodes
                .get_mut(&id)
                .ok_or_else(|| StoreError::node_not_found(partition, id))?;
            // Declarative reset: no change event when the field already
            // holds its default.
            match default {
                Some(default) => {
                    if node.shared.get(&field) == Some(&default) {
                        return Ok(false);
                    }
                    node.shared.insert(field, default);
                }
                None => {
                    if node.shared.remove(&field).is_none() {
                        return Ok(false);
                    }
                }
            }
            Ok(true)
        })?;
        if changed {
            self.emit(ChangeEvent::node(partition, id, ChangeKind::FieldReset).with_field(field));
        }
        Ok(())
    }

    fn write_field(
        &self,
        partition: &str,
        id: NodeId,
        version: &VersionKey,
        field: FieldId,
        value: FieldValue,
    ) -> StoreResult<()> {
        self.with_partition_mut(partition, |part| {
            let node = part
                .nodes
                .get_mut(&id)
                .ok_or_else(|| StoreError::node_not_found(partition, id))?;
            let fields = node.versions.get_mut(version).ok_or_else(|| {
                StoreError::VersionNotFound {
                    id,
                    version: version.clone(),
                }
            })?;
            fields.insert(field, value);
            Ok(())
        })?;
        self.emit(
            ChangeEvent::node(partition, id, ChangeKind::FieldWritten)
                .with_field(field)
                .with_version(version.clone()),
        );
        Ok(())
    }

    fn reset_field(
        &self,
        partition: &str,
        id: NodeId,
        version: &VersionKey,
        field: FieldId,
    ) -> StoreResult<()> {
        let changed = self.with_partition_mut(partition, |part| {
            let default = part
                .nodes
                .get(&id)
                .and_then(|n| part.templates.get(&n.template_id))
                .and_then(|t| t.default_for(field).cloned());
            let node = part
                .nodes
                .get_mut(&id)
                .ok_or_else(|| StoreError::node_not_found(partition, id))?;
            let fields = node.versions.get_mut(version).ok_or_else(|| {
                StoreError::VersionNotFound {
                    id,
                    version: version.clone(),
                }
            })?;
            match default {
                Some(default) => {
                    if fields.get(&field) == Some(&default) {
                        return Ok(false);
                    }
                    fields.insert(field, default);
                }
                None => {
                    if fields.remove(&field).is_none() {
                        return Ok(false);
                    }
                }
            }
            Ok(true)
        })?;
        if changed {
            self.emit(
                ChangeEvent::node(partition, id, ChangeKind::FieldReset)
                    .with_field(field)
                    .with_version(version.clone()),
            );
        }
        Ok(())
    }

    fn invalidate(&self, partition: &str, id: NodeId) {
        self.cache.write().remove(&(partition.to_string(), id));
    }

    fn deserialization_complete(&self, partition: &str) {
        self.completed.write().push(partition.to_string());
    }

    fn suppress_feedback(&self) -> FeedbackGuard {
        FeedbackGuard::engage(Arc::clone(&self.feedback))
    }

    fn feedback_suppressed(&self) -> bool {
        self.feedback.load(Ordering::SeqCst)
    }

    fn pause_notifications(&self) -> NotificationsGuard {
        NotificationsGuard::engage(Arc::clone(&self.paused))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_model::TemplateFieldDef;

    fn store_with_template() -> (MemoryLiveStore, NodeId, FieldId, FieldId) {
        let store = MemoryLiveStore::new();
        store.create_partition("master");
        let template = NodeId::new();
        let shared_field = FieldId::new();
        let versioned_field = FieldId::new();
        store
            .insert_template(
                "master",
                TemplateDef::new(template, "Page")
                    .with_field(
                        shared_field,
                        TemplateFieldDef::new("Icon", FieldScope::Shared)
                            .with_default(FieldValue::text("default-icon")),
                    )
                    .with_field(
                        versioned_field,
                        TemplateFieldDef::new("Title", FieldScope::Versioned),
                    ),
            )
            .unwrap();
        (store, template, shared_field, versioned_field)
    }

    #[test]
    fn create_seeds_defaults_and_initial_version() {
        let (store, template, shared_field, _) = store_with_template();
        let root = NodeId::new();
        let child = NodeId::new();
        store.seed_root("master", root, "site", template).unwrap();
        store
            .create_node("master", root, child, "home", template)
            .unwrap();

        let node = store.node("master", child).unwrap().unwrap();
        assert_eq!(
            node.shared_value(shared_field),
            Some(&FieldValue::text("default-icon"))
        );
        assert!(node.has_version(&VersionKey::new(well_known::INITIAL_LANGUAGE, 1)));
        assert_eq!(node.path.as_str(), "/site/home");
    }

    #[test]
    fn create_requires_parent_and_template() {
        let (store, template, _, _) = store_with_template();
        let result = store.create_node("master", NodeId::new(), NodeId::new(), "x", template);
        assert!(matches!(result, Err(StoreError::NodeNotFound { .. })));

        let root = NodeId::new();
        store.seed_root("master", root, "site", template).unwrap();
        let result = store.create_node("master", root, NodeId::new(), "x", NodeId::new());
        assert!(matches!(result, Err(StoreError::TemplateNotFound { .. })));
    }

    #[test]
    fn cache_is_stale_until_invalidated() {
        let (store, template, _, _) = store_with_template();
        let root = NodeId::new();
        store.seed_root("master", root, "site", template).unwrap();

        // Populate the cache, then mutate without invalidating.
        let before = store.node("master", root).unwrap().unwrap();
        assert_eq!(before.name, "site");
        store.rename_node("master", root, "renamed").unwrap();
        let stale = store.node("master", root).unwrap().unwrap();
        assert_eq!(stale.name, "site");

        store.invalidate("master", root);
        let fresh = store.node("master", root).unwrap().unwrap();
        assert_eq!(fresh.name, "renamed");
    }

    #[test]
    fn move_rejects_cycles() {
        let (store, template, _, _) = store_with_template();
        let root = NodeId::new();
        let child = NodeId::new();
        store.seed_root("master", root, "site", template).unwrap();
        store
            .create_node("master", root, child, "home", template)
            .unwrap();

        let result = store.move_node("master", root, child);
        assert!(matches!(result, Err(StoreError::InvalidOperation { .. })));
    }

    #[test]
    fn delete_removes_subtree() {
        let (store, template, _, _) = store_with_template();
        let root = NodeId::new();
        let child = NodeId::new();
        let grandchild = NodeId::new();
        store.seed_root("master", root, "site", template).unwrap();
        store
            .create_node("master", root, child, "home", template)
            .unwrap();
        store
            .create_node("master", child, grandchild, "news", template)
            .unwrap();

        store.delete_node("master", child).unwrap();
        assert!(store.node("master", child).unwrap().is_none());
        assert!(store.node("master", grandchild).unwrap().is_none());
        assert!(store.children("master", root).unwrap().is_empty());
    }

    #[test]
    fn version_lifecycle() {
        let (store, template, _, versioned_field) = store_with_template();
        let root = NodeId::new();
        store.seed_root("master", root, "site", template).unwrap();

        let key = VersionKey::new("de", 1);
        store.add_version("master", root, &key).unwrap();
        assert!(store.add_version("master", root, &key).is_err());

        store
            .write_field("master", root, &key, versioned_field, FieldValue::text("t"))
            .unwrap();
        let node = store.node("master", root).unwrap().unwrap();
        assert_eq!(
            node.version_fields(&key).unwrap().get(&versioned_field),
            Some(&FieldValue::text("t"))
        );

        store.remove_version("master", root, &key).unwrap();
        assert!(store.remove_version("master", root, &key).is_err());
    }

    #[test]
    fn reset_is_a_noop_at_default() {
        let (store, template, shared_field, _) = store_with_template();
        let root = NodeId::new();
        let child = NodeId::new();
        store.seed_root("master", root, "site", template).unwrap();
        store
            .create_node("master", root, child, "home", template)
            .unwrap();
        store.feed().clear_history();

        // Already at the template default: no event.
        store.reset_shared_field("master", child, shared_field).unwrap();
        assert_eq!(store.feed().history_len(), 0);

        store
            .write_shared_field("master", child, shared_field, FieldValue::text("custom"))
            .unwrap();
        store.reset_shared_field("master", child, shared_field).unwrap();
        let history = store.feed().history();
        assert_eq!(history.last().unwrap().kind, ChangeKind::FieldReset);

        store.invalidate("master", child);
        let node = store.node("master", child).unwrap().unwrap();
        assert_eq!(
            node.shared_value(shared_field),
            Some(&FieldValue::text("default-icon"))
        );
    }

    #[test]
    fn paused_feed_emits_nothing() {
        let (store, template, _, _) = store_with_template();
        let root = NodeId::new();
        {
            let _guard = store.pause_notifications();
            store.seed_root("master", root, "site", template).unwrap();
            store.rename_node("master", root, "renamed").unwrap();
        }
        assert_eq!(store.feed().history_len(), 0);

        store.rename_node("master", root, "again").unwrap();
        assert_eq!(store.feed().history_len(), 1);
    }

    #[test]
    fn feedback_stamps_events() {
        let (store, template, _, _) = store_with_template();
        let root = NodeId::new();
        store.seed_root("master", root, "site", template).unwrap();

        {
            let _guard = store.suppress_feedback();
            assert!(store.feedback_suppressed());
            store.rename_node("master", root, "inside").unwrap();
        }
        assert!(!store.feedback_suppressed());
        store.rename_node("master", root, "outside").unwrap();

        let history = store.feed().history();
        assert!(history[0].self_inflicted);
        assert!(!history[1].self_inflicted);
    }

    #[test]
    fn deserialization_complete_records_partitions() {
        let store = MemoryLiveStore::new();
        store.deserialization_complete("master");
        store.deserialization_complete("web");
        assert_eq!(store.completed_partitions(), vec!["master", "web"]);
    }
}
