//! Property-based test generators.

use proptest::prelude::*;

/// A generated child item: a name plus text field values per version.
#[derive(Debug, Clone)]
pub struct GeneratedChild {
    /// Node name, unique within the generated level.
    pub name: String,
    /// Title value per version number (1-based, contiguous).
    pub titles: Vec<String>,
}

/// Strategy for node names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{2,9}"
}

/// Strategy for text field values, including the empty string.
pub fn text_value_strategy() -> impl Strategy<Value = String> {
    "[ -~]{0,24}"
}

/// Strategy for a flat level of children with unique names and one to
/// three versions each.
pub fn children_strategy(max_children: usize) -> impl Strategy<Value = Vec<GeneratedChild>> {
    prop::collection::vec(
        (
            name_strategy(),
            prop::collection::vec(text_value_strategy(), 1..=3),
        ),
        0..=max_children,
    )
    .prop_map(|raw| {
        let mut seen = Vec::new();
        let mut children = Vec::new();
        for (name, titles) in raw {
            if seen.contains(&name) {
                continue;
            }
            seen.push(name.clone());
            children.push(GeneratedChild { name, titles });
        }
        children
    })
}
