//! The live content store adapter contract.

use crate::error::StoreResult;
use crate::guard::{FeedbackGuard, NotificationsGuard};
use arbor_model::{FieldId, FieldValue, LiveNode, NodeId, TemplateDef, VersionKey};

/// Adapter contract for the live content store.
///
/// The reconciliation engine reads snapshots and applies mutations through
/// this trait only; it never holds mutable node state of its own. Snapshots
/// returned by [`node`](LiveStore::node) may be served from a store-level
/// cache; mutations made during a reconciliation run bypass the standard
/// notification paths, so the engine calls
/// [`invalidate`](LiveStore::invalidate) after every structural mutation to
/// keep reads fresh for the remainder of the run.
pub trait LiveStore: Send + Sync {
    /// Returns a snapshot of the node, or `None` if it does not exist.
    fn node(&self, partition: &str, id: NodeId) -> StoreResult<Option<LiveNode>>;

    /// Returns snapshots of the node's children in store order.
    fn children(&self, partition: &str, id: NodeId) -> StoreResult<Vec<LiveNode>>;

    /// Returns the template definition, or `None` if it does not exist.
    fn template(&self, partition: &str, id: NodeId) -> StoreResult<Option<TemplateDef>>;

    /// Creates a node from a template under an existing parent.
    ///
    /// The store seeds template defaults onto the new node; the caller is
    /// responsible for stripping any content versions the creation
    /// defaulted in if it wants a bare node.
    fn create_node(
        &self,
        partition: &str,
        parent: NodeId,
        id: NodeId,
        name: &str,
        template: NodeId,
    ) -> StoreResult<()>;

    /// Deletes the node and its entire subtree.
    fn delete_node(&self, partition: &str, id: NodeId) -> StoreResult<()>;

    /// Moves the node under a new parent.
    fn move_node(&self, partition: &str, id: NodeId, new_parent: NodeId) -> StoreResult<()>;

    /// Renames the node.
    fn rename_node(&self, partition: &str, id: NodeId, name: &str) -> StoreResult<()>;

    /// Changes the node's structural variant (branch).
    fn set_branch(&self, partition: &str, id: NodeId, branch: Option<NodeId>) -> StoreResult<()>;

    /// Changes the node's structural type (template).
    ///
    /// Only the type identity is swapped; migrating field values between
    /// the old and new definitions is the caller's responsibility.
    fn change_template(&self, partition: &str, id: NodeId, template: NodeId) -> StoreResult<()>;

    /// Adds an empty version to the node.
    fn add_version(&self, partition: &str, id: NodeId, key: &VersionKey) -> StoreResult<()>;

    /// Removes a version from the node.
    fn remove_version(&self, partition: &str, id: NodeId, key: &VersionKey) -> StoreResult<()>;

    /// Writes a shared field value.
    fn write_shared_field(
        &self,
        partition: &str,
        id: NodeId,
        field: FieldId,
        value: FieldValue,
    ) -> StoreResult<()>;

    /// Resets a shared field to its template default.
    fn reset_shared_field(&self, partition: &str, id: NodeId, field: FieldId) -> StoreResult<()>;

    /// Writes a version-scoped field value.
    fn write_field(
        &self,
        partition: &str,
        id: NodeId,
        version: &VersionKey,
        field: FieldId,
        value: FieldValue,
    ) -> StoreResult<()>;

    /// Resets a version-scoped field to its template default.
    fn reset_field(
        &self,
        partition: &str,
        id: NodeId,
        version: &VersionKey,
        field: FieldId,
    ) -> StoreResult<()>;

    /// Drops any store-level cache entries for the node.
    fn invalidate(&self, partition: &str, id: NodeId);

    /// Signals that deserialization has completed for a partition.
    fn deserialization_complete(&self, partition: &str);

    /// Engages the "sync feedback disabled" flag for the guard's lifetime.
    fn suppress_feedback(&self) -> FeedbackGuard;

    /// Returns the current state of the feedback flag.
    fn feedback_suppressed(&self) -> bool;

    /// Pauses change notifications for the guard's lifetime.
    fn pause_notifications(&self) -> NotificationsGuard;
}
