//! Pre-wired test harness combining the in-memory stores and engines.

use crate::builders::{ItemBuilder, TemplateBuilder};
use crate::recorders::{RecordingEvaluator, RecordingLogger};
use arbor_model::{well_known, FieldId, NodeId, SerializedItem};
use arbor_store::{MemoryLiveStore, MemorySerializedTree, SerializedNode, SerializedStore};
use arbor_sync_engine::{
    DuplicateIdChecker, Evaluator, IncludeAll, InclusionOracle, RetryQueue,
    SerializedWinsEvaluator, SyncResult, TreeSyncEngine,
};
use std::sync::Arc;

/// The partition every harness works against.
pub const PARTITION: &str = "master";

/// A ready-to-use reconciliation setup: an in-memory live store with one
/// partition, an anchor node, a page template, an in-memory serialized
/// tree, and recording collaborators.
pub struct TestHarness {
    /// The live store.
    pub store: Arc<MemoryLiveStore>,
    /// The serialized desired-state tree.
    pub tree: Arc<MemorySerializedTree>,
    /// Records every logger callback.
    pub logger: Arc<RecordingLogger>,
    /// Records every evaluator invocation, delegating to the
    /// serialized-wins policy.
    pub evaluator: Arc<RecordingEvaluator>,
    /// Identity of the live anchor node `/content` everything hangs under.
    pub anchor: NodeId,
    /// Identity of the page template.
    pub template: NodeId,
    /// A versioned text field declared by the template.
    pub title_field: FieldId,
    /// A shared text field declared by the template, default
    /// `default-icon`.
    pub icon_field: FieldId,
}

impl TestHarness {
    /// Builds the harness.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryLiveStore::new());
        store.create_partition(PARTITION);

        let template = NodeId::new();
        let title_field = FieldId::new();
        let icon_field = FieldId::new();
        store
            .insert_template(
                PARTITION,
                TemplateBuilder::new(template, "Page")
                    .versioned(title_field, "Title")
                    .shared(icon_field, "Icon", Some("default-icon"))
                    .versioned(well_known::OWNERSHIP_FIELD, "Owner")
                    .build(),
            )
            .expect("partition exists");

        let anchor = NodeId::new();
        store
            .seed_root(PARTITION, anchor, "content", template)
            .expect("anchor seeds");

        let logger = Arc::new(RecordingLogger::new());
        let inner = SerializedWinsEvaluator::new(
            Arc::clone(&store),
            Arc::new(IncludeAll),
            logger.clone() as Arc<dyn arbor_sync_engine::SyncLogger>,
        );
        let evaluator = Arc::new(RecordingEvaluator::wrap(Arc::new(inner)));

        Self {
            store,
            tree: Arc::new(MemorySerializedTree::new()),
            logger,
            evaluator,
            anchor,
            template,
            title_field,
            icon_field,
        }
    }

    /// An engine over the harness stores that includes everything.
    #[must_use]
    pub fn engine(&self) -> TreeSyncEngine<MemoryLiveStore> {
        self.engine_with_oracle(Arc::new(IncludeAll))
    }

    /// An engine with a custom inclusion oracle.
    #[must_use]
    pub fn engine_with_oracle(
        &self,
        oracle: Arc<dyn InclusionOracle>,
    ) -> TreeSyncEngine<MemoryLiveStore> {
        TreeSyncEngine::new(
            Arc::clone(&self.store),
            self.evaluator.clone() as Arc<dyn Evaluator>,
            oracle,
            self.logger.clone() as Arc<dyn arbor_sync_engine::SyncLogger>,
        )
    }

    /// Starts an item builder bound to the harness partition and template.
    #[must_use]
    pub fn item(&self, id: NodeId, parent: NodeId, path: &str) -> ItemBuilder {
        ItemBuilder::new(id, parent, path, self.template).partition(PARTITION)
    }

    /// Inserts a built item into the serialized tree.
    pub fn insert(&self, item: SerializedItem) {
        self.tree.insert(item);
    }

    /// Returns the serialized reference for an inserted item.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Arc<dyn SerializedNode> {
        self.tree.node(id).expect("node present in serialized tree")
    }

    /// Loads one tree with a fresh retry queue and duplicate checker,
    /// using the include-everything oracle.
    pub fn load_root(&self, root: NodeId) -> SyncResult<()> {
        let node = self.node(root);
        let mut retry = RetryQueue::new();
        let mut checker = DuplicateIdChecker::new();
        self.engine().load_tree(&node, &mut retry, &mut checker)
    }

    /// Loads every root of the harness partition via the batch path.
    pub fn load_all_roots(&self) -> SyncResult<()> {
        let roots = self.tree.roots(PARTITION).expect("roots enumerate");
        let mut retry = RetryQueue::new();
        let mut checker = DuplicateIdChecker::new();
        self.engine().load_all(&roots, &mut retry, &mut checker, None)
    }

    /// Clears the recorded logger events, evaluator calls, and change
    /// feed history, keeping store contents.
    pub fn clear_recordings(&self) {
        self.logger.clear();
        self.evaluator.clear();
        self.store.feed().clear_history();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Initializes a tracing subscriber for test debugging.
///
/// Safe to call from multiple tests; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_store::LiveStore;

    #[test]
    fn harness_wires_a_loadable_tree() {
        let harness = TestHarness::new();
        let root = NodeId::new();
        harness.insert(
            harness
                .item(root, harness.anchor, "/content/site")
                .versioned_text("en", 1, harness.title_field, "Site")
                .build(),
        );

        harness.load_root(root).unwrap();

        let node = harness.store.node(PARTITION, root).unwrap().unwrap();
        assert_eq!(node.name, "site");
        assert_eq!(harness.evaluator.new_count(), 1);
    }
}
