//! Inclusion oracles: the scope predicates the walker consults.

use arbor_model::{FieldId, LiveNode, TreePath};
use arbor_store::SerializedNode;

/// The verdict of an inclusion oracle: in scope or not, with an optional
/// justification carried through to skip logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inclusion {
    /// Whether the subject is in scope.
    pub included: bool,
    /// Why the subject was excluded, for skip logging.
    pub justification: Option<String>,
}

impl Inclusion {
    /// Creates an in-scope verdict.
    #[must_use]
    pub fn included() -> Self {
        Self {
            included: true,
            justification: None,
        }
    }

    /// Creates an out-of-scope verdict with a justification.
    #[must_use]
    pub fn excluded(justification: impl Into<String>) -> Self {
        Self {
            included: false,
            justification: Some(justification.into()),
        }
    }
}

/// Decides whether a tree node is in scope of the reconciliation.
///
/// Consulted for serialized references before they are reconciled and for
/// live nodes before they become orphan candidates. Children of an
/// excluded serialized node are never visited.
pub trait InclusionOracle: Send + Sync {
    /// Judges a serialized reference.
    fn includes_serialized(&self, node: &dyn SerializedNode) -> Inclusion;

    /// Judges a live node.
    fn includes_live(&self, node: &LiveNode) -> Inclusion;
}

/// Decides whether a field participates in reconciliation.
///
/// An excluded field is never read or written; the verdict is taken once
/// per field descriptor.
pub trait FieldOracle: Send + Sync {
    /// Judges a field identity.
    fn includes_field(&self, field: FieldId) -> Inclusion;
}

/// An oracle that includes everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeAll;

impl InclusionOracle for IncludeAll {
    fn includes_serialized(&self, _node: &dyn SerializedNode) -> Inclusion {
        Inclusion::included()
    }

    fn includes_live(&self, _node: &LiveNode) -> Inclusion {
        Inclusion::included()
    }
}

impl FieldOracle for IncludeAll {
    fn includes_field(&self, _field: FieldId) -> Inclusion {
        Inclusion::included()
    }
}

/// A path-based inclusion oracle.
///
/// A node is in scope when its path falls under one of the include
/// prefixes and under none of the exclude prefixes. With no include
/// prefixes configured, everything not explicitly excluded is in scope.
#[derive(Debug, Clone, Default)]
pub struct PathScopeOracle {
    includes: Vec<TreePath>,
    excludes: Vec<TreePath>,
}

impl PathScopeOracle {
    /// Creates an oracle with the given include prefixes.
    #[must_use]
    pub fn new(includes: impl IntoIterator<Item = TreePath>) -> Self {
        Self {
            includes: includes.into_iter().collect(),
            excludes: Vec::new(),
        }
    }

    /// Adds an exclude prefix.
    #[must_use]
    pub fn exclude(mut self, prefix: TreePath) -> Self {
        self.excludes.push(prefix);
        self
    }

    fn verdict(&self, path: &TreePath) -> Inclusion {
        if let Some(prefix) = self.excludes.iter().find(|e| path.starts_with(e)) {
            return Inclusion::excluded(format!("{path} is under excluded scope {prefix}"));
        }
        if self.includes.is_empty() || self.includes.iter().any(|i| path.starts_with(i)) {
            return Inclusion::included();
        }
        Inclusion::excluded(format!("{path} is outside all configured scopes"))
    }
}

impl InclusionOracle for PathScopeOracle {
    fn includes_serialized(&self, node: &dyn SerializedNode) -> Inclusion {
        self.verdict(node.path())
    }

    fn includes_live(&self, node: &LiveNode) -> Inclusion {
        self.verdict(&node.path)
    }
}

/// A field oracle that excludes a fixed set of fields.
#[derive(Debug, Clone, Default)]
pub struct FieldFilter {
    excluded: Vec<FieldId>,
}

impl FieldFilter {
    /// Creates a filter excluding the given fields.
    #[must_use]
    pub fn excluding(fields: impl IntoIterator<Item = FieldId>) -> Self {
        Self {
            excluded: fields.into_iter().collect(),
        }
    }
}

impl FieldOracle for FieldFilter {
    fn includes_field(&self, field: FieldId) -> Inclusion {
        if self.excluded.contains(&field) {
            Inclusion::excluded(format!("field {field} is excluded from reconciliation"))
        } else {
            Inclusion::included()
        }
    }
}
