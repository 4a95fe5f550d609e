//! Reserved directive keys.
//!
//! Directives are mapping keys with fixed spellings that alter the default
//! merge behavior. `INCLUDE` and `CONDITIONAL` appear as ordinary entries of
//! any mapping and are consumed by the include-expansion and
//! option-resolution passes; the remaining directives appear as the sole
//! key of a mapping in value position (`k: { "(>)": [..] }`) and are
//! applied during composition.

use bale_yaml::{Node, Value};

/// Pulls other documents in beneath the enclosing mapping's own keys.
pub const INCLUDE: &str = "(@)";

/// Wholesale replacement: suppresses deep merge for mappings. For scalars
/// the outcome is identical to plain composition.
pub const OVERRIDE: &str = "(!)";

/// Concatenate the incoming sequence after the existing one.
pub const LIST_APPEND: &str = "(>)";

/// Concatenate the incoming sequence before the existing one.
pub const LIST_PREPEND: &str = "(<)";

/// Replace the existing sequence entirely.
pub const LIST_OVERWRITE: &str = "(=)";

/// Remove the key from the accumulating tree. Removing an absent key is a
/// no-op.
pub const DELETE: &str = "(-)";

/// Selects among labeled branches based on a resolved option value.
pub const CONDITIONAL: &str = "(?)";

/// Branch label that matches any option value not otherwise declared.
pub const DEFAULT_BRANCH: &str = "(*)";

/// The directives applied in value position during composition.
pub const VALUE_DIRECTIVES: &[&str] = &[OVERRIDE, LIST_APPEND, LIST_PREPEND, LIST_OVERWRITE, DELETE];

/// All reserved directive spellings.
pub const ALL: &[&str] = &[
    INCLUDE,
    OVERRIDE,
    LIST_APPEND,
    LIST_PREPEND,
    LIST_OVERWRITE,
    DELETE,
    CONDITIONAL,
];

/// Whether `key` is a reserved directive spelling.
pub fn is_directive(key: &str) -> bool {
    ALL.contains(&key)
}

/// The value-position directive carried by `node`, if it is a mapping
/// containing one. Validity (the directive being the sole key) is checked
/// by the composer.
pub fn value_directive(node: &Node) -> Option<&'static str> {
    match node.value() {
        Value::Mapping(entries) => VALUE_DIRECTIVES
            .iter()
            .copied()
            .find(|d| entries.contains_key(*d)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bale_yaml::SourceRef;
    use indexmap::IndexMap;

    #[test]
    fn test_is_directive() {
        assert!(is_directive("(>)"));
        assert!(is_directive("(@)"));
        assert!(!is_directive("(*)")); // branch label, not a directive key
        assert!(!is_directive("depends"));
    }

    #[test]
    fn test_value_directive_detection() {
        let mut entries = IndexMap::new();
        entries.insert(
            LIST_APPEND.to_string(),
            Node::new(Value::Sequence(Vec::new()), SourceRef::none()),
        );
        let node = Node::new(Value::Mapping(entries), SourceRef::none());
        assert_eq!(value_directive(&node), Some(LIST_APPEND));

        let plain = Node::new(Value::from("x"), SourceRef::none());
        assert_eq!(value_directive(&plain), None);
    }
}
