//! Recording test doubles for the engine's collaborator traits.

use arbor_model::{FieldId, LiveNode, NodeId, SerializedItem, TreePath, VersionKey};
use arbor_sync_engine::{Evaluator, SyncError, SyncLogger, SyncResult};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// One recorded logger callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// `tree_begin` fired.
    TreeBegin {
        /// Root path.
        root: TreePath,
    },
    /// `tree_end` fired.
    TreeEnd {
        /// Root path.
        root: TreePath,
        /// Items processed in the walk.
        processed: u64,
    },
    /// A node was skipped as excluded.
    SkippedExcluded {
        /// Skipped path.
        path: TreePath,
        /// The oracle's justification.
        justification: Option<String>,
    },
    /// A node was skipped as missing on disk.
    SkippedMissing {
        /// Skipped path.
        path: TreePath,
    },
    /// A node was created.
    NodeCreated {
        /// Item path.
        path: TreePath,
        /// Node identity.
        id: NodeId,
    },
    /// A node was moved.
    NodeMoved {
        /// Item path.
        path: TreePath,
        /// Node identity.
        id: NodeId,
    },
    /// A node was renamed.
    NodeRenamed {
        /// Item path.
        path: TreePath,
        /// Node identity.
        id: NodeId,
    },
    /// A node's branch changed.
    BranchChanged {
        /// Item path.
        path: TreePath,
        /// Node identity.
        id: NodeId,
    },
    /// A node's template changed.
    NodeRetemplated {
        /// Item path.
        path: TreePath,
        /// Node identity.
        id: NodeId,
    },
    /// A node was deleted.
    NodeDeleted {
        /// Node path.
        path: TreePath,
        /// Node identity.
        id: NodeId,
    },
    /// A field changed.
    FieldChanged {
        /// Item path.
        path: TreePath,
        /// Field identity.
        field: FieldId,
        /// Version, for versioned fields.
        version: Option<VersionKey>,
    },
    /// A field was skipped as excluded.
    FieldSkippedExcluded {
        /// Item path.
        path: TreePath,
        /// Field identity.
        field: FieldId,
    },
    /// A field was skipped as undefined by the template.
    FieldSkippedUndefined {
        /// Item path.
        path: TreePath,
        /// Field identity.
        field: FieldId,
    },
    /// A version was added.
    VersionAdded {
        /// Item path.
        path: TreePath,
        /// The added version.
        version: VersionKey,
    },
    /// A version was removed.
    VersionRemoved {
        /// Item path.
        path: TreePath,
        /// The removed version.
        version: VersionKey,
    },
    /// Orphan candidates were committed.
    OrphansDetected {
        /// Path of the level owner.
        level: TreePath,
        /// Identities of the candidates.
        candidates: Vec<NodeId>,
    },
    /// A retry entry failed its deferred replay.
    RetryFailed {
        /// Path of the failing entry.
        path: TreePath,
        /// Rendered error.
        message: String,
    },
}

impl LogEvent {
    /// Returns true for events that represent an actual change to the
    /// live tree.
    #[must_use]
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            LogEvent::NodeCreated { .. }
                | LogEvent::NodeMoved { .. }
                | LogEvent::NodeRenamed { .. }
                | LogEvent::BranchChanged { .. }
                | LogEvent::NodeRetemplated { .. }
                | LogEvent::NodeDeleted { .. }
                | LogEvent::FieldChanged { .. }
                | LogEvent::VersionAdded { .. }
                | LogEvent::VersionRemoved { .. }
        )
    }
}

/// A logger that records every callback for later assertions.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl RecordingLogger {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events in order.
    #[must_use]
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    /// Clears the recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Counts events matching a predicate.
    pub fn count(&self, predicate: impl Fn(&LogEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }

    /// Counts events that represent an actual change to the live tree.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.count(LogEvent::is_change)
    }

    fn push(&self, event: LogEvent) {
        self.events.lock().push(event);
    }
}

impl SyncLogger for RecordingLogger {
    fn tree_begin(&self, root: &TreePath) {
        self.push(LogEvent::TreeBegin { root: root.clone() });
    }

    fn tree_end(&self, root: &TreePath, processed: u64, _elapsed: Duration) {
        self.push(LogEvent::TreeEnd {
            root: root.clone(),
            processed,
        });
    }

    fn skipped_excluded(&self, path: &TreePath, justification: Option<&str>) {
        self.push(LogEvent::SkippedExcluded {
            path: path.clone(),
            justification: justification.map(str::to_string),
        });
    }

    fn skipped_missing(&self, path: &TreePath) {
        self.push(LogEvent::SkippedMissing { path: path.clone() });
    }

    fn node_created(&self, path: &TreePath, id: NodeId) {
        self.push(LogEvent::NodeCreated {
            path: path.clone(),
            id,
        });
    }

    fn node_moved(&self, path: &TreePath, id: NodeId, _new_parent: NodeId) {
        self.push(LogEvent::NodeMoved {
            path: path.clone(),
            id,
        });
    }

    fn node_renamed(&self, path: &TreePath, id: NodeId, _old_name: &str, _new_name: &str) {
        self.push(LogEvent::NodeRenamed {
            path: path.clone(),
            id,
        });
    }

    fn branch_changed(&self, path: &TreePath, id: NodeId) {
        self.push(LogEvent::BranchChanged {
            path: path.clone(),
            id,
        });
    }

    fn node_retemplated(
        &self,
        path: &TreePath,
        id: NodeId,
        _old_template: NodeId,
        _new_template: NodeId,
    ) {
        self.push(LogEvent::NodeRetemplated {
            path: path.clone(),
            id,
        });
    }

    fn node_deleted(&self, path: &TreePath, id: NodeId) {
        self.push(LogEvent::NodeDeleted {
            path: path.clone(),
            id,
        });
    }

    fn field_changed(&self, path: &TreePath, field: FieldId, version: Option<&VersionKey>) {
        self.push(LogEvent::FieldChanged {
            path: path.clone(),
            field,
            version: version.cloned(),
        });
    }

    fn field_skipped_excluded(&self, path: &TreePath, field: FieldId, _justification: Option<&str>) {
        self.push(LogEvent::FieldSkippedExcluded {
            path: path.clone(),
            field,
        });
    }

    fn field_skipped_undefined(&self, path: &TreePath, field: FieldId, _template: NodeId) {
        self.push(LogEvent::FieldSkippedUndefined {
            path: path.clone(),
            field,
        });
    }

    fn version_added(&self, path: &TreePath, version: &VersionKey) {
        self.push(LogEvent::VersionAdded {
            path: path.clone(),
            version: version.clone(),
        });
    }

    fn version_removed(&self, path: &TreePath, version: &VersionKey) {
        self.push(LogEvent::VersionRemoved {
            path: path.clone(),
            version: version.clone(),
        });
    }

    fn orphans_detected(&self, level: &TreePath, candidates: &[LiveNode]) {
        self.push(LogEvent::OrphansDetected {
            level: level.clone(),
            candidates: candidates.iter().map(|n| n.id).collect(),
        });
    }

    fn retry_failed(&self, path: &TreePath, error: &SyncError) {
        self.push(LogEvent::RetryFailed {
            path: path.clone(),
            message: error.to_string(),
        });
    }
}

/// One recorded evaluator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluatorCall {
    /// `evaluate_new` for the given item identity.
    New(NodeId),
    /// `evaluate_update` for the given item identity.
    Update(NodeId),
    /// `evaluate_orphans` with the given candidate identities.
    Orphans(Vec<NodeId>),
}

/// An evaluator that records every invocation and delegates to an inner
/// policy.
pub struct RecordingEvaluator {
    inner: Arc<dyn Evaluator>,
    calls: Mutex<Vec<EvaluatorCall>>,
}

impl RecordingEvaluator {
    /// Wraps an inner evaluator.
    pub fn wrap(inner: Arc<dyn Evaluator>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the recorded calls in order.
    #[must_use]
    pub fn calls(&self) -> Vec<EvaluatorCall> {
        self.calls.lock().clone()
    }

    /// Clears the recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Returns the candidate-id batches passed to the orphan path.
    #[must_use]
    pub fn orphan_batches(&self) -> Vec<Vec<NodeId>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                EvaluatorCall::Orphans(ids) => Some(ids.clone()),
                _ => None,
            })
            .collect()
    }

    /// Counts `evaluate_new` invocations.
    #[must_use]
    pub fn new_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, EvaluatorCall::New(_)))
            .count()
    }

    /// Counts `evaluate_update` invocations.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, EvaluatorCall::Update(_)))
            .count()
    }
}

impl Evaluator for RecordingEvaluator {
    fn evaluate_new(&self, item: &SerializedItem) -> SyncResult<Option<LiveNode>> {
        self.calls.lock().push(EvaluatorCall::New(item.id));
        self.inner.evaluate_new(item)
    }

    fn evaluate_update(
        &self,
        item: &SerializedItem,
        existing: &LiveNode,
    ) -> SyncResult<Option<LiveNode>> {
        self.calls.lock().push(EvaluatorCall::Update(item.id));
        self.inner.evaluate_update(item, existing)
    }

    fn evaluate_orphans(&self, candidates: &[LiveNode]) -> SyncResult<()> {
        self.calls
            .lock()
            .push(EvaluatorCall::Orphans(candidates.iter().map(|n| n.id).collect()));
        self.inner.evaluate_orphans(candidates)
    }
}
