//! Template definitions (structural types).

use crate::field::{FieldScope, FieldValue};
use crate::id::{FieldId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Definition of one field declared by a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFieldDef {
    /// Display name of the field.
    pub name: String,
    /// Whether values of this field are shared or variant-scoped.
    pub scope: FieldScope,
    /// The default value a node falls back to when no explicit value is
    /// set; `None` means the field defaults to empty.
    pub default: Option<FieldValue>,
}

impl TemplateFieldDef {
    /// Creates a field definition with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, scope: FieldScope) -> Self {
        Self {
            name: name.into(),
            scope,
            default: None,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: FieldValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// A structural type: the set of fields a node of this type carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDef {
    /// Identity of the template node.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Declared fields, keyed by field identity.
    pub fields: BTreeMap<FieldId, TemplateFieldDef>,
}

impl TemplateDef {
    /// Creates a template with no fields.
    #[must_use]
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field definition.
    #[must_use]
    pub fn with_field(mut self, field: FieldId, def: TemplateFieldDef) -> Self {
        self.fields.insert(field, def);
        self
    }

    /// Returns true if the template declares the given field.
    #[must_use]
    pub fn defines(&self, field: FieldId) -> bool {
        self.fields.contains_key(&field)
    }

    /// Returns the definition of a field, if declared.
    #[must_use]
    pub fn field(&self, field: FieldId) -> Option<&TemplateFieldDef> {
        self.fields.get(&field)
    }

    /// Returns the default value for a field, if the template declares one.
    #[must_use]
    pub fn default_for(&self, field: FieldId) -> Option<&FieldValue> {
        self.fields.get(&field).and_then(|d| d.default.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_declaration() {
        let field = FieldId::new();
        let other = FieldId::new();
        let template = TemplateDef::new(NodeId::new(), "Page").with_field(
            field,
            TemplateFieldDef::new("Title", FieldScope::Versioned)
                .with_default(FieldValue::text("Untitled")),
        );

        assert!(template.defines(field));
        assert!(!template.defines(other));
        assert_eq!(
            template.default_for(field),
            Some(&FieldValue::text("Untitled"))
        );
        assert_eq!(template.default_for(other), None);
    }
}
