//! The item merge engine: reconciles one serialized item into one live
//! node.

use crate::error::{SyncError, SyncResult};
use crate::logger::SyncLogger;
use crate::oracle::FieldOracle;
use arbor_model::{
    well_known, FieldDescriptor, FieldValue, LiveNode, SerializedItem, SerializedValue,
    TemplateDef, VersionKey,
};
use arbor_store::LiveStore;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::sync::Arc;

/// Reconciles one serialized item description into a single live node.
///
/// Structural changes run first (create, move, retemplate, rename), then
/// fine-grained field- and version-level patching with orphaned
/// field/version cleanup. The engine is idempotent: reconciling an
/// already-converged item performs no writes and emits no change
/// notifications, with one deliberate exception: binary payloads are
/// always rewritten, bypassing equality checks.
pub struct ItemMergeEngine<S: LiveStore> {
    store: Arc<S>,
    field_oracle: Arc<dyn FieldOracle>,
    logger: Arc<dyn SyncLogger>,
}

impl<S: LiveStore> ItemMergeEngine<S> {
    /// Creates a merge engine over a live store.
    pub fn new(
        store: Arc<S>,
        field_oracle: Arc<dyn FieldOracle>,
        logger: Arc<dyn SyncLogger>,
    ) -> Self {
        Self {
            store,
            field_oracle,
            logger,
        }
    }

    /// Reconciles `item` into the live store and returns a fresh snapshot
    /// of the resulting node.
    ///
    /// Fails with [`SyncError::ParentNotFound`] when creating under an
    /// unresolvable parent, [`SyncError::MovedItemParentNotFound`] when an
    /// existing item's serialized parent is unresolvable, and wraps any
    /// other failure with the item's path. A partially created node is
    /// deleted before a creation failure surfaces.
    pub fn reconcile(
        &self,
        item: &SerializedItem,
        allow_missing_fields: bool,
    ) -> SyncResult<LiveNode> {
        self.reconcile_inner(item, allow_missing_fields)
            .map_err(|error| SyncError::reconciliation(item.path.clone(), error))
    }

    fn reconcile_inner(
        &self,
        item: &SerializedItem,
        allow_missing_fields: bool,
    ) -> SyncResult<LiveNode> {
        let partition = item.partition.as_str();
        let existing = self.store.node(partition, item.id)?;
        let parent = self.store.node(partition, item.parent_id)?;

        let created;
        let live = match existing {
            None => {
                let parent = parent.ok_or_else(|| SyncError::ParentNotFound {
                    parent_id: item.parent_id,
                    item_id: item.id,
                    path: item.path.clone(),
                })?;
                self.store
                    .create_node(partition, parent.id, item.id, &item.name, item.template_id)?;
                self.store.invalidate(partition, item.id);
                self.logger.node_created(&item.path, item.id);
                created = true;
                self.fetch(item)?
            }
            Some(node) => {
                let parent = parent.ok_or_else(|| SyncError::MovedItemParentNotFound {
                    parent_id: item.parent_id,
                    item_id: item.id,
                    path: item.path.clone(),
                })?;
                created = false;
                if node.parent_id != Some(parent.id) {
                    self.store.move_node(partition, item.id, parent.id)?;
                    self.store.invalidate(partition, item.id);
                    self.logger.node_moved(&item.path, item.id, parent.id);
                    self.fetch(item)?
                } else {
                    node
                }
            }
        };

        match self.converge(item, live, created, allow_missing_fields) {
            Ok(node) => Ok(node),
            Err(error) => {
                if created {
                    // Never leave an uncommitted create behind on failure.
                    let _ = self.store.delete_node(partition, item.id);
                    self.store.invalidate(partition, item.id);
                }
                Err(error)
            }
        }
    }

    /// Applies retemplate, rename, and field/version patching to an
    /// already-resolved live node.
    fn converge(
        &self,
        item: &SerializedItem,
        mut live: LiveNode,
        created: bool,
        allow_missing_fields: bool,
    ) -> SyncResult<LiveNode> {
        let partition = item.partition.as_str();

        if created {
            // A fresh node starts with zero content versions under this
            // model: strip whatever the creation defaulted in.
            for key in live.version_keys() {
                self.store.remove_version(partition, item.id, &key)?;
            }
            self.store.invalidate(partition, item.id);
            live = self.fetch(item)?;
        }

        let mut structural = false;

        if live.template_id != item.template_id {
            self.retemplate(item, &live)?;
            structural = true;
        }

        if live.name != item.name {
            self.store.rename_node(partition, item.id, &item.name)?;
            self.logger
                .node_renamed(&item.path, item.id, &live.name, &item.name);
            structural = true;
        }
        if live.branch_id != item.branch_id {
            self.store.set_branch(partition, item.id, item.branch_id)?;
            self.logger.branch_changed(&item.path, item.id);
            structural = true;
        }

        if structural {
            // Structural operations stale any cached snapshot.
            self.store.invalidate(partition, item.id);
            live = self.fetch(item)?;
        }

        let template = self
            .store
            .template(partition, live.template_id)?
            .ok_or_else(|| SyncError::TemplateNotFound {
                template_id: live.template_id,
                path: item.path.clone(),
            })?;

        self.patch_shared_fields(item, &live, &template, allow_missing_fields)?;
        self.sync_versions(item, live, &template, allow_missing_fields)?;

        self.store.invalidate(partition, item.id);
        self.fetch(item)
    }

    /// Swaps the structural type and migrates field values by the delta
    /// between the old and new definitions.
    fn retemplate(&self, item: &SerializedItem, live: &LiveNode) -> SyncResult<()> {
        let partition = item.partition.as_str();
        let new_def = self
            .store
            .template(partition, item.template_id)?
            .ok_or_else(|| SyncError::TemplateNotFound {
                template_id: item.template_id,
                path: item.path.clone(),
            })?;
        // When the old type was deleted earlier in the same run it no
        // longer resolves; the new type then serves as its own comparison
        // baseline. Best effort: values the new type does not know about
        // survive in that case.
        let baseline = self
            .store
            .template(partition, live.template_id)?
            .unwrap_or_else(|| new_def.clone());

        let old_template = live.template_id;
        self.store
            .change_template(partition, item.id, item.template_id)?;

        for field in baseline.fields.keys() {
            if new_def.defines(*field) {
                continue;
            }
            if live.shared_fields.contains_key(field) {
                self.store.reset_shared_field(partition, item.id, *field)?;
            }
            for key in live.version_keys() {
                let present = live
                    .version_fields(&key)
                    .is_some_and(|fields| fields.contains_key(field));
                if present {
                    self.store.reset_field(partition, item.id, &key, *field)?;
                }
            }
        }

        self.logger
            .node_retemplated(&item.path, item.id, old_template, item.template_id);
        Ok(())
    }

    /// Patches shared fields: orphaned values reset to template defaults,
    /// supplied descriptors applied.
    fn patch_shared_fields(
        &self,
        item: &SerializedItem,
        live: &LiveNode,
        template: &TemplateDef,
        allow_missing_fields: bool,
    ) -> SyncResult<()> {
        let partition = item.partition.as_str();
        for (field, value) in &live.shared_fields {
            if item.supplies_shared(*field) {
                continue;
            }
            // Field access is template-driven: values outside the type are
            // invisible to patching.
            if !template.defines(*field) {
                continue;
            }
            let verdict = self.field_oracle.includes_field(*field);
            if !verdict.included {
                self.logger.field_skipped_excluded(
                    &item.path,
                    *field,
                    verdict.justification.as_deref(),
                );
                continue;
            }
            if Some(value) != template.default_for(*field) {
                self.store.reset_shared_field(partition, item.id, *field)?;
                self.store.invalidate(partition, item.id);
                self.logger.field_changed(&item.path, *field, None);
            }
        }

        for descriptor in &item.shared_fields {
            self.apply_field(item, live, None, descriptor, template, allow_missing_fields)?;
        }
        Ok(())
    }

    /// Resolves, patches, and prunes versions so the live node carries
    /// exactly the versions the item describes.
    fn sync_versions(
        &self,
        item: &SerializedItem,
        mut live: LiveNode,
        template: &TemplateDef,
        allow_missing_fields: bool,
    ) -> SyncResult<()> {
        let partition = item.partition.as_str();
        let mut stale: Vec<VersionKey> = live.version_keys();

        for version in &item.versions {
            stale.retain(|key| key != &version.key);

            if !live.has_version(&version.key) {
                self.store.add_version(partition, item.id, &version.key)?;
                self.store.invalidate(partition, item.id);
                self.logger.version_added(&item.path, &version.key);
                live = self.fetch(item)?;
            }

            let current = live
                .version_fields(&version.key)
                .cloned()
                .unwrap_or_default();
            for (field, value) in &current {
                if *field == well_known::OWNERSHIP_FIELD || version.supplies(*field) {
                    continue;
                }
                if !template.defines(*field) {
                    continue;
                }
                let verdict = self.field_oracle.includes_field(*field);
                if !verdict.included {
                    self.logger.field_skipped_excluded(
                        &item.path,
                        *field,
                        verdict.justification.as_deref(),
                    );
                    continue;
                }
                if Some(value) != template.default_for(*field) {
                    self.store
                        .reset_field(partition, item.id, &version.key, *field)?;
                    self.store.invalidate(partition, item.id);
                    self.logger
                        .field_changed(&item.path, *field, Some(&version.key));
                }
            }

            // Authorship is cleared only when explicitly described as
            // absent, in its own pass.
            if !version.supplies(well_known::OWNERSHIP_FIELD)
                && template.defines(well_known::OWNERSHIP_FIELD)
            {
                if let Some(value) = current.get(&well_known::OWNERSHIP_FIELD) {
                    if Some(value) != template.default_for(well_known::OWNERSHIP_FIELD) {
                        self.store.reset_field(
                            partition,
                            item.id,
                            &version.key,
                            well_known::OWNERSHIP_FIELD,
                        )?;
                        self.store.invalidate(partition, item.id);
                        self.logger.field_changed(
                            &item.path,
                            well_known::OWNERSHIP_FIELD,
                            Some(&version.key),
                        );
                    }
                }
            }

            for descriptor in &version.fields {
                self.apply_field(
                    item,
                    &live,
                    Some(&version.key),
                    descriptor,
                    template,
                    allow_missing_fields,
                )?;
            }
        }

        // Versions live but absent from the desired state are pruned,
        // symmetric to item-level orphan handling.
        for key in stale {
            self.store.remove_version(partition, item.id, &key)?;
            self.store.invalidate(partition, item.id);
            self.logger.version_removed(&item.path, &key);
        }
        Ok(())
    }

    /// Applies one field descriptor using the patch rule: binary payloads
    /// are decoded and always rewritten, text values only when different.
    fn apply_field(
        &self,
        item: &SerializedItem,
        live: &LiveNode,
        version: Option<&VersionKey>,
        descriptor: &FieldDescriptor,
        template: &TemplateDef,
        allow_missing_fields: bool,
    ) -> SyncResult<()> {
        let verdict = self.field_oracle.includes_field(descriptor.field);
        if !verdict.included {
            self.logger.field_skipped_excluded(
                &item.path,
                descriptor.field,
                verdict.justification.as_deref(),
            );
            return Ok(());
        }

        if !template.defines(descriptor.field) {
            if !allow_missing_fields {
                return Err(SyncError::MissingTemplateField {
                    template_id: template.id,
                    field_id: descriptor.field,
                    path: item.path.clone(),
                });
            }
            self.logger
                .field_skipped_undefined(&item.path, descriptor.field, template.id);
            return Ok(());
        }

        match &descriptor.value {
            SerializedValue::Blob(encoded) => {
                let raw = BASE64
                    .decode(encoded.as_bytes())
                    .map_err(|source| SyncError::BlobDecode {
                        field_id: descriptor.field,
                        path: item.path.clone(),
                        source,
                    })?;
                self.write(live, version, descriptor, FieldValue::Blob(raw))?;
                self.logger
                    .field_changed(&item.path, descriptor.field, version);
            }
            SerializedValue::Text(text) => {
                let current = match version {
                    None => live.shared_fields.get(&descriptor.field),
                    Some(key) => live
                        .version_fields(key)
                        .and_then(|fields| fields.get(&descriptor.field)),
                };
                let differs = match current {
                    Some(FieldValue::Text(existing)) => existing != text,
                    _ => true,
                };
                if differs {
                    self.write(live, version, descriptor, FieldValue::text(text.clone()))?;
                    self.logger
                        .field_changed(&item.path, descriptor.field, version);
                }
            }
        }
        Ok(())
    }

    fn write(
        &self,
        live: &LiveNode,
        version: Option<&VersionKey>,
        descriptor: &FieldDescriptor,
        value: FieldValue,
    ) -> SyncResult<()> {
        match version {
            None => {
                self.store
                    .write_shared_field(&live.partition, live.id, descriptor.field, value)?
            }
            Some(key) => {
                self.store
                    .write_field(&live.partition, live.id, key, descriptor.field, value)?
            }
        }
        self.store.invalidate(&live.partition, live.id);
        Ok(())
    }

    fn fetch(&self, item: &SerializedItem) -> SyncResult<LiveNode> {
        self.store.node(&item.partition, item.id)?.ok_or_else(|| {
            SyncError::Store(arbor_store::StoreError::node_not_found(
                &item.partition,
                item.id,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::TracingLogger;
    use crate::oracle::{FieldFilter, IncludeAll};
    use arbor_model::{
        FieldId, FieldScope, NodeId, SerializedVersion, TemplateDef, TemplateFieldDef, TreePath,
    };
    use arbor_store::{ChangeKind, MemoryLiveStore};

    struct Fixture {
        store: Arc<MemoryLiveStore>,
        anchor: NodeId,
        template: NodeId,
        title: FieldId,
        icon: FieldId,
        data: FieldId,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryLiveStore::new());
            store.create_partition("master");
            let template = NodeId::new();
            let title = FieldId::new();
            let icon = FieldId::new();
            let data = FieldId::new();
            store
                .insert_template(
                    "master",
                    TemplateDef::new(template, "Page")
                        .with_field(title, TemplateFieldDef::new("Title", FieldScope::Versioned))
                        .with_field(
                            icon,
                            TemplateFieldDef::new("Icon", FieldScope::Shared)
                                .with_default(FieldValue::text("default-icon")),
                        )
                        .with_field(data, TemplateFieldDef::new("Data", FieldScope::Versioned))
                        .with_field(
                            well_known::OWNERSHIP_FIELD,
                            TemplateFieldDef::new("Owner", FieldScope::Versioned),
                        ),
                )
                .unwrap();
            let anchor = NodeId::new();
            store.seed_root("master", anchor, "site", template).unwrap();
            Self {
                store,
                anchor,
                template,
                title,
                icon,
                data,
            }
        }

        fn engine(&self) -> ItemMergeEngine<MemoryLiveStore> {
            ItemMergeEngine::new(
                Arc::clone(&self.store),
                Arc::new(IncludeAll),
                Arc::new(TracingLogger),
            )
        }

        fn item(&self, id: NodeId, name: &str) -> SerializedItem {
            SerializedItem {
                id,
                parent_id: self.anchor,
                template_id: self.template,
                branch_id: None,
                name: name.into(),
                partition: "master".into(),
                path: TreePath::new(format!("/site/{name}")),
                shared_fields: Vec::new(),
                versions: Vec::new(),
            }
        }
    }

    fn version_with(
        key: VersionKey,
        fields: impl IntoIterator<Item = FieldDescriptor>,
    ) -> SerializedVersion {
        SerializedVersion {
            key,
            fields: fields.into_iter().collect(),
        }
    }

    #[test]
    fn creates_node_with_fields_and_versions() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let id = NodeId::new();
        let mut item = fixture.item(id, "home");
        item.shared_fields
            .push(FieldDescriptor::shared(fixture.icon, "custom-icon"));
        item.versions.push(version_with(
            VersionKey::new("en", 1),
            [FieldDescriptor::versioned(fixture.title, "Home")],
        ));

        let node = engine.reconcile(&item, false).unwrap();

        assert_eq!(node.name, "home");
        assert_eq!(
            node.shared_value(fixture.icon),
            Some(&FieldValue::text("custom-icon"))
        );
        // The creation-defaulted initial version is stripped; only the
        // serialized version remains.
        assert_eq!(node.version_keys(), vec![VersionKey::new("en", 1)]);
        assert_eq!(
            node.version_fields(&VersionKey::new("en", 1))
                .unwrap()
                .get(&fixture.title),
            Some(&FieldValue::text("Home"))
        );
    }

    #[test]
    fn create_under_missing_parent_fails() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let mut item = fixture.item(NodeId::new(), "stray");
        item.parent_id = NodeId::new();

        let err = engine.reconcile(&item, false).unwrap_err();
        assert!(matches!(err, SyncError::ParentNotFound { .. }));
    }

    #[test]
    fn moved_item_with_missing_parent_is_distinct() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let id = NodeId::new();
        let item = fixture.item(id, "home");
        engine.reconcile(&item, false).unwrap();

        let mut moved = fixture.item(id, "home");
        moved.parent_id = NodeId::new();
        let err = engine.reconcile(&moved, false).unwrap_err();
        assert!(matches!(err, SyncError::MovedItemParentNotFound { .. }));
    }

    #[test]
    fn failed_create_deletes_the_partial_node() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let id = NodeId::new();
        let mut item = fixture.item(id, "broken");
        // Undefined field with missing-field errors enabled fails the
        // create after the node exists.
        item.shared_fields
            .push(FieldDescriptor::shared(FieldId::new(), "x"));

        let err = engine.reconcile(&item, false).unwrap_err();
        assert!(matches!(err, SyncError::MissingTemplateField { .. }));
        assert!(fixture.store.node("master", id).unwrap().is_none());
    }

    #[test]
    fn undefined_field_is_skipped_when_tolerated() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let id = NodeId::new();
        let mut item = fixture.item(id, "drifted");
        let unknown = FieldId::new();
        item.shared_fields.push(FieldDescriptor::shared(unknown, "x"));

        let node = engine.reconcile(&item, true).unwrap();
        assert_eq!(node.shared_value(unknown), None);
    }

    #[test]
    fn moves_existing_node_to_serialized_parent() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let folder = NodeId::new();
        let page = NodeId::new();
        engine.reconcile(&fixture.item(folder, "folder"), false).unwrap();
        engine.reconcile(&fixture.item(page, "page"), false).unwrap();

        let mut moved = fixture.item(page, "page");
        moved.parent_id = folder;
        moved.path = TreePath::new("/site/folder/page");
        let node = engine.reconcile(&moved, false).unwrap();

        assert_eq!(node.parent_id, Some(folder));
        assert_eq!(node.path.as_str(), "/site/folder/page");
    }

    #[test]
    fn renames_and_changes_branch_independently() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let id = NodeId::new();
        engine.reconcile(&fixture.item(id, "old-name"), false).unwrap();

        let branch = NodeId::new();
        let mut renamed = fixture.item(id, "new-name");
        renamed.branch_id = Some(branch);
        let node = engine.reconcile(&renamed, false).unwrap();

        assert_eq!(node.name, "new-name");
        assert_eq!(node.branch_id, Some(branch));
    }

    #[test]
    fn retype_preserves_shared_field_and_sets_new_field() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let shared_a = FieldId::new();
        let new_b = FieldId::new();
        let old_template = NodeId::new();
        let new_template = NodeId::new();
        fixture
            .store
            .insert_template(
                "master",
                TemplateDef::new(old_template, "Old")
                    .with_field(shared_a, TemplateFieldDef::new("A", FieldScope::Shared)),
            )
            .unwrap();
        fixture
            .store
            .insert_template(
                "master",
                TemplateDef::new(new_template, "New")
                    .with_field(shared_a, TemplateFieldDef::new("A", FieldScope::Shared))
                    .with_field(new_b, TemplateFieldDef::new("B", FieldScope::Shared)),
            )
            .unwrap();

        let id = NodeId::new();
        let mut item = fixture.item(id, "retyped");
        item.template_id = old_template;
        item.shared_fields.push(FieldDescriptor::shared(shared_a, "kept"));
        engine.reconcile(&item, false).unwrap();

        let mut retyped = fixture.item(id, "retyped");
        retyped.template_id = new_template;
        retyped.shared_fields.push(FieldDescriptor::shared(shared_a, "kept"));
        retyped.shared_fields.push(FieldDescriptor::shared(new_b, "added"));
        let node = engine.reconcile(&retyped, false).unwrap();

        assert_eq!(node.template_id, new_template);
        assert_eq!(node.shared_value(shared_a), Some(&FieldValue::text("kept")));
        assert_eq!(node.shared_value(new_b), Some(&FieldValue::text("added")));
    }

    #[test]
    fn retype_drops_fields_the_new_template_lacks() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let gone = FieldId::new();
        let old_template = NodeId::new();
        let new_template = NodeId::new();
        fixture
            .store
            .insert_template(
                "master",
                TemplateDef::new(old_template, "Old")
                    .with_field(gone, TemplateFieldDef::new("Gone", FieldScope::Shared)),
            )
            .unwrap();
        fixture
            .store
            .insert_template("master", TemplateDef::new(new_template, "New"))
            .unwrap();

        let id = NodeId::new();
        let mut item = fixture.item(id, "narrowed");
        item.template_id = old_template;
        item.shared_fields.push(FieldDescriptor::shared(gone, "v"));
        engine.reconcile(&item, false).unwrap();

        let mut narrowed = fixture.item(id, "narrowed");
        narrowed.template_id = new_template;
        let node = engine.reconcile(&narrowed, false).unwrap();
        assert_eq!(node.shared_value(gone), None);
    }

    #[test]
    fn retype_with_deleted_old_template_keeps_stale_values() {
        // Known approximation: with the old definition gone, the new type
        // is its own comparison baseline, so values the new type does not
        // define survive the retype instead of being migrated away.
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let stale_field = FieldId::new();
        let old_template = NodeId::new();
        let new_template = NodeId::new();
        fixture
            .store
            .insert_template(
                "master",
                TemplateDef::new(old_template, "Old")
                    .with_field(stale_field, TemplateFieldDef::new("S", FieldScope::Shared)),
            )
            .unwrap();
        fixture
            .store
            .insert_template("master", TemplateDef::new(new_template, "New"))
            .unwrap();

        let id = NodeId::new();
        let mut item = fixture.item(id, "orphaned-type");
        item.template_id = old_template;
        item.shared_fields
            .push(FieldDescriptor::shared(stale_field, "v"));
        engine.reconcile(&item, false).unwrap();

        // The old type gets deleted before this item retypes.
        fixture.store.remove_template("master", old_template).unwrap();

        let mut retyped = fixture.item(id, "orphaned-type");
        retyped.template_id = new_template;
        let node = engine.reconcile(&retyped, false).unwrap();

        assert_eq!(node.template_id, new_template);
        assert_eq!(
            node.shared_value(stale_field),
            Some(&FieldValue::text("v"))
        );
    }

    #[test]
    fn version_pruning_is_symmetric() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let id = NodeId::new();
        let mut item = fixture.item(id, "versioned");
        item.versions.push(version_with(
            VersionKey::new("en", 1),
            [FieldDescriptor::versioned(fixture.title, "v1")],
        ));
        item.versions.push(version_with(
            VersionKey::new("en", 2),
            [FieldDescriptor::versioned(fixture.title, "v2")],
        ));
        engine.reconcile(&item, false).unwrap();

        let mut next = fixture.item(id, "versioned");
        next.versions.push(version_with(
            VersionKey::new("en", 2),
            [FieldDescriptor::versioned(fixture.title, "v2")],
        ));
        next.versions.push(version_with(
            VersionKey::new("de", 1),
            [FieldDescriptor::versioned(fixture.title, "v1-de")],
        ));
        let node = engine.reconcile(&next, false).unwrap();

        // en#1 removed, en#2 preserved, de#1 created.
        assert_eq!(
            node.version_keys(),
            vec![VersionKey::new("de", 1), VersionKey::new("en", 2)]
        );
        assert_eq!(
            node.version_fields(&VersionKey::new("en", 2))
                .unwrap()
                .get(&fixture.title),
            Some(&FieldValue::text("v2"))
        );
    }

    #[test]
    fn absent_versioned_field_resets_but_supplied_survives() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let id = NodeId::new();
        let key = VersionKey::new("en", 1);
        let mut item = fixture.item(id, "page");
        item.versions.push(version_with(
            key.clone(),
            [
                FieldDescriptor::versioned(fixture.title, "t"),
                FieldDescriptor::versioned(fixture.data, "d"),
            ],
        ));
        engine.reconcile(&item, false).unwrap();

        let mut next = fixture.item(id, "page");
        next.versions.push(version_with(
            key.clone(),
            [FieldDescriptor::versioned(fixture.title, "t")],
        ));
        let node = engine.reconcile(&next, false).unwrap();

        let fields = node.version_fields(&key).unwrap();
        assert_eq!(fields.get(&fixture.title), Some(&FieldValue::text("t")));
        assert_eq!(fields.get(&fixture.data), None);
    }

    #[test]
    fn ownership_cleared_only_when_absent() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let id = NodeId::new();
        let key = VersionKey::new("en", 1);
        let mut item = fixture.item(id, "owned");
        item.versions.push(version_with(
            key.clone(),
            [FieldDescriptor::versioned(
                well_known::OWNERSHIP_FIELD,
                "alice",
            )],
        ));
        engine.reconcile(&item, false).unwrap();

        // Supplied: value preserved.
        let node = engine.reconcile(&item, false).unwrap();
        assert_eq!(
            node.version_fields(&key).unwrap().get(&well_known::OWNERSHIP_FIELD),
            Some(&FieldValue::text("alice"))
        );

        // Explicitly absent: cleared.
        let mut cleared = fixture.item(id, "owned");
        cleared.versions.push(version_with(key.clone(), []));
        let node = engine.reconcile(&cleared, false).unwrap();
        assert_eq!(
            node.version_fields(&key).unwrap().get(&well_known::OWNERSHIP_FIELD),
            None
        );
    }

    #[test]
    fn second_reconcile_of_text_tree_is_silent() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let id = NodeId::new();
        let mut item = fixture.item(id, "steady");
        item.shared_fields
            .push(FieldDescriptor::shared(fixture.icon, "icon"));
        item.versions.push(version_with(
            VersionKey::new("en", 1),
            [FieldDescriptor::versioned(fixture.title, "t")],
        ));
        engine.reconcile(&item, false).unwrap();

        fixture.store.feed().clear_history();
        engine.reconcile(&item, false).unwrap();
        assert_eq!(fixture.store.feed().history_len(), 0);
    }

    #[test]
    fn binary_fields_are_always_rewritten() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let id = NodeId::new();
        let encoded = BASE64.encode(b"payload");
        let mut item = fixture.item(id, "binary");
        item.shared_fields
            .push(FieldDescriptor::shared_blob(fixture.icon, encoded));
        let node = engine.reconcile(&item, false).unwrap();
        assert_eq!(
            node.shared_value(fixture.icon),
            Some(&FieldValue::Blob(b"payload".to_vec()))
        );

        fixture.store.feed().clear_history();
        engine.reconcile(&item, false).unwrap();
        let rewrites = fixture
            .store
            .feed()
            .history()
            .iter()
            .filter(|e| e.kind == ChangeKind::FieldWritten && e.field == Some(fixture.icon))
            .count();
        assert_eq!(rewrites, 1);
    }

    #[test]
    fn undecodable_blob_fails_with_the_item_path() {
        let fixture = Fixture::new();
        let engine = fixture.engine();
        let id = NodeId::new();
        let mut item = fixture.item(id, "junk");
        item.shared_fields
            .push(FieldDescriptor::shared_blob(fixture.icon, "!!not-base64!!"));

        let err = engine.reconcile(&item, false).unwrap_err();
        assert!(matches!(err, SyncError::Reconciliation { .. }));
        assert!(err.to_string().contains("/site/junk"));
    }

    #[test]
    fn excluded_field_is_never_written() {
        let fixture = Fixture::new();
        let engine = ItemMergeEngine::new(
            Arc::clone(&fixture.store),
            Arc::new(FieldFilter::excluding([fixture.icon])),
            Arc::new(TracingLogger),
        );
        let id = NodeId::new();
        let mut item = fixture.item(id, "filtered");
        item.shared_fields
            .push(FieldDescriptor::shared(fixture.icon, "never"));

        let node = engine.reconcile(&item, false).unwrap();
        // The template default stays; the excluded descriptor is ignored.
        assert_eq!(
            node.shared_value(fixture.icon),
            Some(&FieldValue::text("default-icon"))
        );
    }
}
