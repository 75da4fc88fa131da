//! Logical tree paths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized logical path within a content tree.
///
/// Paths are `/`-separated, always absolute, and never end with a trailing
/// separator (except the root path `/` itself). Segment comparisons are
/// case-insensitive, matching the content store's path semantics, while the
/// original casing is preserved for display.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreePath(String);

impl TreePath {
    /// Creates a path from a raw string, normalizing separators.
    ///
    /// Empty segments are collapsed and a leading `/` is enforced.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        let mut normalized = String::with_capacity(raw.as_ref().len() + 1);
        for segment in raw.as_ref().split('/').filter(|s| !s.is_empty()) {
            normalized.push('/');
            normalized.push_str(segment);
        }
        if normalized.is_empty() {
            normalized.push('/');
        }
        Self(normalized)
    }

    /// Returns the root path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self("/".into())
    }

    /// Returns the path as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Iterates over the path segments, root first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Returns the final segment, or an empty string for the root path.
    #[must_use]
    pub fn leaf(&self) -> &str {
        if self.is_root() {
            return "";
        }
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Returns the parent path, or `None` for the root path.
    #[must_use]
    pub fn parent(&self) -> Option<TreePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Returns this path extended by one child segment.
    #[must_use]
    pub fn child(&self, name: &str) -> TreePath {
        Self::new(format!("{}/{}", self.0, name))
    }

    /// Returns true if this path equals or descends from `prefix`.
    ///
    /// Comparison is segment-aware and case-insensitive, so `/a/bc` is not
    /// under `/a/b` and `/A/B` is under `/a/b`.
    #[must_use]
    pub fn starts_with(&self, prefix: &TreePath) -> bool {
        if prefix.is_root() {
            return true;
        }
        let mut own = self.segments();
        for expected in prefix.segments() {
            match own.next() {
                Some(segment) if segment.eq_ignore_ascii_case(expected) => {}
                _ => return false,
            }
        }
        true
    }
}

impl fmt::Debug for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreePath({})", self.0)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TreePath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for TreePath {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        assert_eq!(TreePath::new("a/b/c").as_str(), "/a/b/c");
        assert_eq!(TreePath::new("/a//b/").as_str(), "/a/b");
        assert_eq!(TreePath::new("").as_str(), "/");
        assert_eq!(TreePath::new("///").as_str(), "/");
    }

    #[test]
    fn leaf_and_parent() {
        let path = TreePath::new("/site/home/news");
        assert_eq!(path.leaf(), "news");
        assert_eq!(path.parent().unwrap().as_str(), "/site/home");
        assert_eq!(TreePath::new("/site").parent().unwrap(), TreePath::root());
        assert!(TreePath::root().parent().is_none());
        assert_eq!(TreePath::root().leaf(), "");
    }

    #[test]
    fn child_extension() {
        let path = TreePath::new("/site");
        assert_eq!(path.child("home").as_str(), "/site/home");
    }

    #[test]
    fn starts_with_is_segment_aware() {
        let path = TreePath::new("/a/bc/d");
        assert!(path.starts_with(&TreePath::new("/a/bc")));
        assert!(path.starts_with(&TreePath::new("/a")));
        assert!(path.starts_with(&TreePath::root()));
        assert!(!path.starts_with(&TreePath::new("/a/b")));
    }

    #[test]
    fn starts_with_ignores_case() {
        let path = TreePath::new("/Site/Home");
        assert!(path.starts_with(&TreePath::new("/site/home")));
        assert!(path.starts_with(&TreePath::new("/SITE")));
    }
}
