//! Builders for serialized items and templates.

use arbor_model::{
    FieldDescriptor, FieldId, FieldScope, FieldValue, NodeId, SerializedItem, SerializedVersion,
    TemplateDef, TemplateFieldDef, TreePath, VersionKey,
};

/// Fluent builder for [`SerializedItem`] test data.
///
/// The item's name is derived from the leaf of its path.
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    item: SerializedItem,
}

impl ItemBuilder {
    /// Starts an item with the required structural attributes.
    #[must_use]
    pub fn new(id: NodeId, parent: NodeId, path: &str, template: NodeId) -> Self {
        let path = TreePath::new(path);
        Self {
            item: SerializedItem {
                id,
                parent_id: parent,
                template_id: template,
                branch_id: None,
                name: path.leaf().to_string(),
                partition: "master".into(),
                path,
                shared_fields: Vec::new(),
                versions: Vec::new(),
            },
        }
    }

    /// Sets the owning partition.
    #[must_use]
    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.item.partition = partition.into();
        self
    }

    /// Sets the structural variant (branch).
    #[must_use]
    pub fn branch(mut self, branch: NodeId) -> Self {
        self.item.branch_id = Some(branch);
        self
    }

    /// Adds a shared text field.
    #[must_use]
    pub fn shared_text(mut self, field: FieldId, value: impl Into<String>) -> Self {
        self.item
            .shared_fields
            .push(FieldDescriptor::shared(field, value));
        self
    }

    /// Adds a shared binary field from a base64 payload.
    #[must_use]
    pub fn shared_blob(mut self, field: FieldId, base64: impl Into<String>) -> Self {
        self.item
            .shared_fields
            .push(FieldDescriptor::shared_blob(field, base64));
        self
    }

    /// Adds an empty version.
    #[must_use]
    pub fn version(mut self, language: &str, number: u32) -> Self {
        self.item
            .versions
            .push(SerializedVersion::new(VersionKey::new(language, number)));
        self
    }

    /// Adds a versioned text field, creating the version if needed.
    #[must_use]
    pub fn versioned_text(
        mut self,
        language: &str,
        number: u32,
        field: FieldId,
        value: impl Into<String>,
    ) -> Self {
        let key = VersionKey::new(language, number);
        let descriptor = FieldDescriptor::versioned(field, value);
        match self.item.versions.iter_mut().find(|v| v.key == key) {
            Some(version) => version.fields.push(descriptor),
            None => {
                let mut version = SerializedVersion::new(key);
                version.fields.push(descriptor);
                self.item.versions.push(version);
            }
        }
        self
    }

    /// Finishes the item.
    #[must_use]
    pub fn build(self) -> SerializedItem {
        self.item
    }
}

/// Builds a template with the common text-field shapes tests need.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    def: TemplateDef,
}

impl TemplateBuilder {
    /// Starts a template.
    #[must_use]
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            def: TemplateDef::new(id, name),
        }
    }

    /// Adds a versioned text field.
    #[must_use]
    pub fn versioned(mut self, field: FieldId, name: impl Into<String>) -> Self {
        self.def = self
            .def
            .with_field(field, TemplateFieldDef::new(name, FieldScope::Versioned));
        self
    }

    /// Adds a shared text field with an optional default.
    #[must_use]
    pub fn shared(mut self, field: FieldId, name: impl Into<String>, default: Option<&str>) -> Self {
        let mut def = TemplateFieldDef::new(name, FieldScope::Shared);
        if let Some(default) = default {
            def = def.with_default(FieldValue::text(default));
        }
        self.def = self.def.with_field(field, def);
        self
    }

    /// Finishes the template.
    #[must_use]
    pub fn build(self) -> TemplateDef {
        self.def
    }
}
