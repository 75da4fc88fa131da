//! Error types for the reconciliation engines.

use arbor_model::{FieldId, NodeId, TreePath};
use arbor_store::StoreError;
use thiserror::Error;

/// Result type for reconciliation operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during reconciliation.
///
/// The taxonomy is deliberately flat: callers pattern-match on the kind
/// instead of catching by type. Three predicates drive control flow in the
/// walker: [`is_fatal`](SyncError::is_fatal) aborts the entire run,
/// [`propagates`](SyncError::propagates) unwinds out of the walk without
/// being queued, and
/// [`is_structural_prerequisite`](SyncError::is_structural_prerequisite)
/// marks failures that resolve once a sibling materializes the missing
/// parent or type.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An invariant violation detected by the consistency checker.
    ///
    /// Fatal: never retried, aborts the whole tree walk.
    #[error("consistency violation for {item_id} at {path}: {message}")]
    ConsistencyViolation {
        /// Identity of the offending item.
        item_id: NodeId,
        /// Path of the offending item.
        path: TreePath,
        /// Description of the violation.
        message: String,
    },

    /// The serialized parent does not resolve to a live node on create.
    #[error("parent {parent_id} not found for new item {item_id} at {path}")]
    ParentNotFound {
        /// The unresolvable parent identity.
        parent_id: NodeId,
        /// Identity of the item being created.
        item_id: NodeId,
        /// Path of the item being created.
        path: TreePath,
    },

    /// The live item exists but its serialized parent is unresolvable:
    /// the item used to have a different, still-missing, new parent.
    #[error("parent {parent_id} not found for moved item {item_id} at {path}")]
    MovedItemParentNotFound {
        /// The unresolvable parent identity.
        parent_id: NodeId,
        /// Identity of the moved item.
        item_id: NodeId,
        /// Path of the moved item.
        path: TreePath,
    },

    /// The retemplate target type does not exist.
    #[error("template {template_id} not found for item at {path}")]
    TemplateNotFound {
        /// The missing template identity.
        template_id: NodeId,
        /// Path of the item being retyped.
        path: TreePath,
    },

    /// The target structural type does not define a serialized field.
    ///
    /// Policy-gated: fatal unless the caller opted into tolerating schema
    /// drift via `allow_missing_fields`.
    #[error("template {template_id} does not define field {field_id} (item at {path})")]
    MissingTemplateField {
        /// The template that lacks the field.
        template_id: NodeId,
        /// The undefined field.
        field_id: FieldId,
        /// Path of the item carrying the descriptor.
        path: TreePath,
    },

    /// A binary field payload could not be decoded.
    #[error("undecodable binary payload in field {field_id} at {path}")]
    BlobDecode {
        /// The field carrying the payload.
        field_id: FieldId,
        /// Path of the item.
        path: TreePath,
        /// The decode failure.
        #[source]
        source: base64::DecodeError,
    },

    /// Catch-all reconciliation failure, wrapping the original cause and
    /// the failed item's path.
    #[error("reconciliation failed at {path}: {source}")]
    Reconciliation {
        /// Path of the item that failed.
        path: TreePath,
        /// The underlying failure.
        #[source]
        source: Box<SyncError>,
    },

    /// The evaluator failed while processing orphan candidates.
    ///
    /// Propagates out of the walk; orphan handling is not retried.
    #[error("orphan handling failed at {path}: {source}")]
    OrphanHandling {
        /// Path of the level whose orphans were being handled.
        path: TreePath,
        /// The underlying failure.
        #[source]
        source: Box<SyncError>,
    },

    /// Store adapter failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Returns true if this error aborts the entire run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::ConsistencyViolation { .. })
    }

    /// Returns true if this error unwinds out of the walk instead of
    /// being queued for retry.
    pub fn propagates(&self) -> bool {
        matches!(
            self,
            SyncError::ConsistencyViolation { .. } | SyncError::OrphanHandling { .. }
        )
    }

    /// Returns true if this error denotes a missing structural
    /// prerequisite that a deferred replay can resolve.
    pub fn is_structural_prerequisite(&self) -> bool {
        matches!(
            self,
            SyncError::ParentNotFound { .. } | SyncError::MovedItemParentNotFound { .. }
        )
    }

    /// Creates a consistency violation.
    pub fn consistency_violation(
        item_id: NodeId,
        path: TreePath,
        message: impl Into<String>,
    ) -> Self {
        Self::ConsistencyViolation {
            item_id,
            path,
            message: message.into(),
        }
    }

    /// Wraps a failure with the path of the item that failed.
    ///
    /// Errors that already carry their own identity (consistency, parent,
    /// template, and field kinds) pass through unwrapped.
    pub fn reconciliation(path: TreePath, source: SyncError) -> Self {
        match source {
            passthrough @ (SyncError::ConsistencyViolation { .. }
            | SyncError::ParentNotFound { .. }
            | SyncError::MovedItemParentNotFound { .. }
            | SyncError::TemplateNotFound { .. }
            | SyncError::MissingTemplateField { .. }
            | SyncError::Reconciliation { .. }
            | SyncError::OrphanHandling { .. }) => passthrough,
            other => Self::Reconciliation {
                path,
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> TreePath {
        TreePath::new("/site/home")
    }

    #[test]
    fn fatal_and_propagating() {
        let violation = SyncError::consistency_violation(NodeId::new(), path(), "dup");
        assert!(violation.is_fatal());
        assert!(violation.propagates());

        let orphan = SyncError::OrphanHandling {
            path: path(),
            source: Box::new(SyncError::Store(StoreError::unknown_partition("x"))),
        };
        assert!(!orphan.is_fatal());
        assert!(orphan.propagates());

        let store = SyncError::Store(StoreError::unknown_partition("x"));
        assert!(!store.is_fatal());
        assert!(!store.propagates());
    }

    #[test]
    fn structural_prerequisites() {
        let parent = SyncError::ParentNotFound {
            parent_id: NodeId::new(),
            item_id: NodeId::new(),
            path: path(),
        };
        assert!(parent.is_structural_prerequisite());

        let moved = SyncError::MovedItemParentNotFound {
            parent_id: NodeId::new(),
            item_id: NodeId::new(),
            path: path(),
        };
        assert!(moved.is_structural_prerequisite());
        assert!(!moved.is_fatal());
    }

    #[test]
    fn reconciliation_wraps_generic_causes_only() {
        let wrapped =
            SyncError::reconciliation(path(), SyncError::Store(StoreError::unknown_partition("x")));
        assert!(matches!(wrapped, SyncError::Reconciliation { .. }));

        let parent = SyncError::ParentNotFound {
            parent_id: NodeId::new(),
            item_id: NodeId::new(),
            path: path(),
        };
        let unwrapped = SyncError::reconciliation(path(), parent);
        assert!(unwrapped.is_structural_prerequisite());
    }

    #[test]
    fn error_display_includes_path() {
        let wrapped =
            SyncError::reconciliation(path(), SyncError::Store(StoreError::unknown_partition("x")));
        assert!(wrapped.to_string().contains("/site/home"));
    }
}
