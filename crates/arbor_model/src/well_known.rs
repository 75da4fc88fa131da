//! Well-known identifiers consumed by the reconciliation rules.

use crate::id::FieldId;

/// Path segment that marks structural/type-definition content.
///
/// When a tree level contains a child whose path ends in this segment, that
/// child is reconciled before its siblings so type definitions exist before
/// content depending on them.
pub const TEMPLATES_SEGMENT: &str = "templates";

/// Name of a structure-definition defaults record (a type's default-values
/// child). These records are never deletion candidates during orphan
/// detection and are reconciled after their level completes.
pub const DEFAULTS_RECORD_NAME: &str = "__defaults";

/// The ownership/authorship field.
///
/// During version patching this field is reset in its own pass: it is
/// cleared only when the serialized version explicitly omits it, never as a
/// side effect of the generic absent-field reset.
pub const OWNERSHIP_FIELD: FieldId = FieldId::from_bytes([
    0x6f, 0x77, 0x6e, 0x65, 0x72, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
]);

/// The language used for versions a store seeds onto freshly created nodes.
pub const INITIAL_LANGUAGE: &str = "en";

/// Returns true if `segment` is the distinguished templates segment.
#[must_use]
pub fn is_templates_segment(segment: &str) -> bool {
    segment.eq_ignore_ascii_case(TEMPLATES_SEGMENT)
}

/// Returns true if `name` names a structure-definition defaults record.
#[must_use]
pub fn is_defaults_name(name: &str) -> bool {
    name.eq_ignore_ascii_case(DEFAULTS_RECORD_NAME)
}
