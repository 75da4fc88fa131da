//! Structured logging callbacks for reconciliation runs.

use crate::error::SyncError;
use arbor_model::{FieldId, LiveNode, NodeId, TreePath, VersionKey};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Structured sink for everything a reconciliation run reports.
///
/// Every skip carries its justification and every structural change is
/// reported individually, so a sink can reconstruct exactly what a run
/// did. The default sink is [`TracingLogger`]; tests typically substitute
/// a recording sink.
pub trait SyncLogger: Send + Sync {
    /// A tree walk is starting at `root`.
    fn tree_begin(&self, root: &TreePath);

    /// A tree walk finished: `processed` items in `elapsed`.
    fn tree_end(&self, root: &TreePath, processed: u64, elapsed: Duration);

    /// A node was skipped because the inclusion oracle excluded it.
    fn skipped_excluded(&self, path: &TreePath, justification: Option<&str>);

    /// A node was skipped because its serialized data is missing on disk.
    fn skipped_missing(&self, path: &TreePath);

    /// A live node was created.
    fn node_created(&self, path: &TreePath, id: NodeId);

    /// A live node was moved under a new parent.
    fn node_moved(&self, path: &TreePath, id: NodeId, new_parent: NodeId);

    /// A live node was renamed.
    fn node_renamed(&self, path: &TreePath, id: NodeId, old_name: &str, new_name: &str);

    /// A live node's structural variant (branch) changed.
    fn branch_changed(&self, path: &TreePath, id: NodeId);

    /// A live node's structural type changed.
    fn node_retemplated(&self, path: &TreePath, id: NodeId, old_template: NodeId, new_template: NodeId);

    /// A live node was deleted.
    fn node_deleted(&self, path: &TreePath, id: NodeId);

    /// A field value was written or reset.
    fn field_changed(&self, path: &TreePath, field: FieldId, version: Option<&VersionKey>);

    /// A field was skipped because the field oracle excluded it.
    fn field_skipped_excluded(&self, path: &TreePath, field: FieldId, justification: Option<&str>);

    /// A field was skipped because the target template does not define it.
    fn field_skipped_undefined(&self, path: &TreePath, field: FieldId, template: NodeId);

    /// A version was added to a live node.
    fn version_added(&self, path: &TreePath, version: &VersionKey);

    /// A version was removed from a live node.
    fn version_removed(&self, path: &TreePath, version: &VersionKey);

    /// Orphan candidates were committed for a tree level.
    fn orphans_detected(&self, level: &TreePath, candidates: &[LiveNode]);

    /// A queued entry still failed after the deferred replay.
    fn retry_failed(&self, path: &TreePath, error: &SyncError);
}

/// The default logging sink, forwarding every callback to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl SyncLogger for TracingLogger {
    fn tree_begin(&self, root: &TreePath) {
        info!(root = %root, "loading tree");
    }

    fn tree_end(&self, root: &TreePath, processed: u64, elapsed: Duration) {
        info!(root = %root, processed, elapsed_ms = elapsed.as_millis() as u64, "tree loaded");
    }

    fn skipped_excluded(&self, path: &TreePath, justification: Option<&str>) {
        debug!(path = %path, justification = justification.unwrap_or("not included"), "skipped");
    }

    fn skipped_missing(&self, path: &TreePath) {
        debug!(path = %path, "skipped: serialized data missing on disk");
    }

    fn node_created(&self, path: &TreePath, id: NodeId) {
        info!(path = %path, id = %id, "created node");
    }

    fn node_moved(&self, path: &TreePath, id: NodeId, new_parent: NodeId) {
        info!(path = %path, id = %id, new_parent = %new_parent, "moved node");
    }

    fn node_renamed(&self, path: &TreePath, id: NodeId, old_name: &str, new_name: &str) {
        info!(path = %path, id = %id, old_name, new_name, "renamed node");
    }

    fn branch_changed(&self, path: &TreePath, id: NodeId) {
        info!(path = %path, id = %id, "changed branch");
    }

    fn node_retemplated(
        &self,
        path: &TreePath,
        id: NodeId,
        old_template: NodeId,
        new_template: NodeId,
    ) {
        info!(path = %path, id = %id, old_template = %old_template, new_template = %new_template, "changed template");
    }

    fn node_deleted(&self, path: &TreePath, id: NodeId) {
        info!(path = %path, id = %id, "deleted node");
    }

    fn field_changed(&self, path: &TreePath, field: FieldId, version: Option<&VersionKey>) {
        match version {
            Some(version) => debug!(path = %path, field = %field, version = %version, "field updated"),
            None => debug!(path = %path, field = %field, "shared field updated"),
        }
    }

    fn field_skipped_excluded(&self, path: &TreePath, field: FieldId, justification: Option<&str>) {
        debug!(path = %path, field = %field, justification = justification.unwrap_or("not included"), "field skipped");
    }

    fn field_skipped_undefined(&self, path: &TreePath, field: FieldId, template: NodeId) {
        warn!(path = %path, field = %field, template = %template, "field not defined by template, skipped");
    }

    fn version_added(&self, path: &TreePath, version: &VersionKey) {
        debug!(path = %path, version = %version, "version added");
    }

    fn version_removed(&self, path: &TreePath, version: &VersionKey) {
        debug!(path = %path, version = %version, "version removed");
    }

    fn orphans_detected(&self, level: &TreePath, candidates: &[LiveNode]) {
        info!(level = %level, count = candidates.len(), "orphan candidates detected");
    }

    fn retry_failed(&self, path: &TreePath, error: &SyncError) {
        warn!(path = %path, error = %error, "retry still failing after deferred replay");
    }
}
