//! Version keys for language/revision variants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one version of a node: a language variant plus a revision
/// number within that language.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionKey {
    /// The language tag, e.g. `en` or `de-DE`.
    pub language: String,
    /// The revision number within the language, starting at 1.
    pub number: u32,
}

impl VersionKey {
    /// Creates a version key.
    #[must_use]
    pub fn new(language: impl Into<String>, number: u32) -> Self {
        Self {
            language: language.into(),
            number,
        }
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.language, self.number)
    }
}
