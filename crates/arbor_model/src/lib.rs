//! # Arbor Model
//!
//! Shared value types for the Arbor content reconciliation engine.
//!
//! This crate provides:
//! - Node and field identities (`NodeId`, `FieldId`)
//! - Logical tree paths (`TreePath`)
//! - Field values, descriptors, and scopes
//! - Version keys for language/revision variants
//! - Serialized item records (desired state read from disk)
//! - Live node snapshots (current state of the content store)
//! - Template definitions (structural types)
//! - Well-known identifiers used by the reconciliation rules

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod field;
mod id;
mod item;
mod node;
mod path;
mod template;
mod version;
pub mod well_known;

pub use field::{FieldDescriptor, FieldScope, FieldValue, SerializedValue};
pub use id::{FieldId, NodeId};
pub use item::{SerializedItem, SerializedVersion};
pub use node::LiveNode;
pub use path::TreePath;
pub use template::{TemplateDef, TemplateFieldDef};
pub use version::VersionKey;
