//! Error types for store adapters.

use arbor_model::{NodeId, TreePath, VersionKey};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur at the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The partition does not exist.
    #[error("unknown partition: {name}")]
    UnknownPartition {
        /// Name of the partition.
        name: String,
    },

    /// The node does not exist in the partition.
    #[error("node not found: {id} in partition {partition}")]
    NodeNotFound {
        /// The partition searched.
        partition: String,
        /// The identity that was not found.
        id: NodeId,
    },

    /// The template definition does not exist.
    #[error("template not found: {id} in partition {partition}")]
    TemplateNotFound {
        /// The partition searched.
        partition: String,
        /// The template identity.
        id: NodeId,
    },

    /// The version does not exist on the node.
    #[error("version {version} not found on node {id}")]
    VersionNotFound {
        /// The node identity.
        id: NodeId,
        /// The missing version.
        version: VersionKey,
    },

    /// Serialized data exists but could not be read.
    #[error("serialized data unreadable at {path}: {message}")]
    Unreadable {
        /// Path of the unreadable reference.
        path: TreePath,
        /// Description of the failure.
        message: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl StoreError {
    /// Creates an unknown-partition error.
    pub fn unknown_partition(name: impl Into<String>) -> Self {
        Self::UnknownPartition { name: name.into() }
    }

    /// Creates a node-not-found error.
    pub fn node_not_found(partition: impl Into<String>, id: NodeId) -> Self {
        Self::NodeNotFound {
            partition: partition.into(),
            id,
        }
    }

    /// Creates a template-not-found error.
    pub fn template_not_found(partition: impl Into<String>, id: NodeId) -> Self {
        Self::TemplateNotFound {
            partition: partition.into(),
            id,
        }
    }

    /// Creates an unreadable-data error.
    pub fn unreadable(path: TreePath, message: impl Into<String>) -> Self {
        Self::Unreadable {
            path,
            message: message.into(),
        }
    }

    /// Creates an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
