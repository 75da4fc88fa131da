//! Field values and descriptors.

use crate::id::FieldId;
use serde::{Deserialize, Serialize};

/// The scope of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldScope {
    /// The value is independent of language and version.
    Shared,
    /// The value is scoped to one language/revision variant.
    Versioned,
}

/// A field value as stored on a live node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    /// A text value.
    Text(String),
    /// A raw binary payload.
    Blob(Vec<u8>),
}

impl FieldValue {
    /// Creates a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Blob(_) => None,
        }
    }

    /// Returns true if this is a binary value.
    #[must_use]
    pub fn is_blob(&self) -> bool {
        matches!(self, Self::Blob(_))
    }
}

/// A field value as carried by a serialized item.
///
/// Binary payloads are carried base64-encoded and decoded at patch time;
/// text values are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerializedValue {
    /// A text value.
    Text(String),
    /// A base64-encoded binary payload.
    Blob(String),
}

impl SerializedValue {
    /// Returns true if this is a binary value.
    #[must_use]
    pub fn is_blob(&self) -> bool {
        matches!(self, Self::Blob(_))
    }
}

/// One field of a serialized item: identity, raw value, and scope.
///
/// A serialized item carries at most one descriptor per field identity per
/// scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// The field identity.
    pub field: FieldId,
    /// The raw serialized value.
    pub value: SerializedValue,
    /// Whether the value is shared or variant-scoped.
    pub scope: FieldScope,
}

impl FieldDescriptor {
    /// Creates a shared text field descriptor.
    #[must_use]
    pub fn shared(field: FieldId, value: impl Into<String>) -> Self {
        Self {
            field,
            value: SerializedValue::Text(value.into()),
            scope: FieldScope::Shared,
        }
    }

    /// Creates a shared binary field descriptor from a base64 payload.
    #[must_use]
    pub fn shared_blob(field: FieldId, base64: impl Into<String>) -> Self {
        Self {
            field,
            value: SerializedValue::Blob(base64.into()),
            scope: FieldScope::Shared,
        }
    }

    /// Creates a versioned text field descriptor.
    #[must_use]
    pub fn versioned(field: FieldId, value: impl Into<String>) -> Self {
        Self {
            field,
            value: SerializedValue::Text(value.into()),
            scope: FieldScope::Versioned,
        }
    }

    /// Creates a versioned binary field descriptor from a base64 payload.
    #[must_use]
    pub fn versioned_blob(field: FieldId, base64: impl Into<String>) -> Self {
        Self {
            field,
            value: SerializedValue::Blob(base64.into()),
            scope: FieldScope::Versioned,
        }
    }
}
