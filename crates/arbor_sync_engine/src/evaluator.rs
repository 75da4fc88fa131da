//! The evaluator contract: external policy deciding whether and how to
//! apply a computed reconciliation.

use crate::error::SyncResult;
use crate::logger::SyncLogger;
use crate::merge::ItemMergeEngine;
use crate::oracle::FieldOracle;
use arbor_model::{LiveNode, SerializedItem};
use arbor_store::LiveStore;
use std::sync::Arc;

/// Policy hooks the tree walker invokes for every in-scope item.
///
/// The walker decides *what* needs attention (new item, update, orphans);
/// the evaluator decides *whether and how* to act on it. Implementations
/// typically route new/update through [`ItemMergeEngine`].
pub trait Evaluator: Send + Sync {
    /// An in-scope serialized item with no live counterpart.
    ///
    /// Returns the resulting live node, or `None` if nothing was produced.
    fn evaluate_new(&self, item: &SerializedItem) -> SyncResult<Option<LiveNode>>;

    /// An in-scope serialized item with an existing live counterpart.
    ///
    /// Returns the replacement node, or `None` if the live node was left
    /// unchanged.
    fn evaluate_update(&self, item: &SerializedItem, existing: &LiveNode)
        -> SyncResult<Option<LiveNode>>;

    /// Live nodes in scope of the sync with no serialized counterpart at
    /// their tree level.
    fn evaluate_orphans(&self, candidates: &[LiveNode]) -> SyncResult<()>;
}

/// The straightforward policy: the serialized tree always wins.
///
/// New and updated items reconcile unconditionally through the merge
/// engine; orphans are deleted together with their subtrees.
pub struct SerializedWinsEvaluator<S: LiveStore> {
    store: Arc<S>,
    merge: ItemMergeEngine<S>,
    logger: Arc<dyn SyncLogger>,
    allow_missing_fields: bool,
}

impl<S: LiveStore> SerializedWinsEvaluator<S> {
    /// Creates the evaluator with its own merge engine.
    pub fn new(
        store: Arc<S>,
        field_oracle: Arc<dyn FieldOracle>,
        logger: Arc<dyn SyncLogger>,
    ) -> Self {
        let merge = ItemMergeEngine::new(Arc::clone(&store), field_oracle, Arc::clone(&logger));
        Self {
            store,
            merge,
            logger,
            allow_missing_fields: false,
        }
    }

    /// Tolerate serialized fields the target template does not define.
    #[must_use]
    pub fn allow_missing_fields(mut self, allow: bool) -> Self {
        self.allow_missing_fields = allow;
        self
    }
}

impl<S: LiveStore> Evaluator for SerializedWinsEvaluator<S> {
    fn evaluate_new(&self, item: &SerializedItem) -> SyncResult<Option<LiveNode>> {
        Ok(Some(self.merge.reconcile(item, self.allow_missing_fields)?))
    }

    fn evaluate_update(
        &self,
        item: &SerializedItem,
        _existing: &LiveNode,
    ) -> SyncResult<Option<LiveNode>> {
        Ok(Some(self.merge.reconcile(item, self.allow_missing_fields)?))
    }

    fn evaluate_orphans(&self, candidates: &[LiveNode]) -> SyncResult<()> {
        for orphan in candidates {
            self.store.delete_node(&orphan.partition, orphan.id)?;
            self.store.invalidate(&orphan.partition, orphan.id);
            self.logger.node_deleted(&orphan.path, orphan.id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::TracingLogger;
    use crate::oracle::IncludeAll;
    use arbor_model::{NodeId, TemplateDef, TreePath};
    use arbor_store::MemoryLiveStore;

    fn setup() -> (Arc<MemoryLiveStore>, NodeId, NodeId) {
        let store = Arc::new(MemoryLiveStore::new());
        store.create_partition("master");
        let template = NodeId::new();
        store
            .insert_template("master", TemplateDef::new(template, "Page"))
            .unwrap();
        let anchor = NodeId::new();
        store.seed_root("master", anchor, "site", template).unwrap();
        (store, anchor, template)
    }

    fn item(id: NodeId, parent: NodeId, template: NodeId, name: &str) -> SerializedItem {
        SerializedItem {
            id,
            parent_id: parent,
            template_id: template,
            branch_id: None,
            name: name.into(),
            partition: "master".into(),
            path: TreePath::new(format!("/site/{name}")),
            shared_fields: Vec::new(),
            versions: Vec::new(),
        }
    }

    #[test]
    fn new_items_reconcile_through_the_merge_engine() {
        let (store, anchor, template) = setup();
        let evaluator = SerializedWinsEvaluator::new(
            Arc::clone(&store),
            Arc::new(IncludeAll),
            Arc::new(TracingLogger),
        );

        let id = NodeId::new();
        let produced = evaluator
            .evaluate_new(&item(id, anchor, template, "home"))
            .unwrap();
        assert_eq!(produced.unwrap().id, id);
        assert!(store.node("master", id).unwrap().is_some());
    }

    #[test]
    fn orphans_are_deleted_with_their_subtrees() {
        let (store, anchor, template) = setup();
        let evaluator = SerializedWinsEvaluator::new(
            Arc::clone(&store),
            Arc::new(IncludeAll),
            Arc::new(TracingLogger),
        );

        let orphan = NodeId::new();
        let child = NodeId::new();
        store
            .create_node("master", anchor, orphan, "stray", template)
            .unwrap();
        store
            .create_node("master", orphan, child, "leaf", template)
            .unwrap();

        let snapshot = store.node("master", orphan).unwrap().unwrap();
        evaluator.evaluate_orphans(&[snapshot]).unwrap();

        assert!(store.node("master", orphan).unwrap().is_none());
        assert!(store.node("master", child).unwrap().is_none());
    }
}
