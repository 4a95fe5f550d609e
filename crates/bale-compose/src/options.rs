//! Resolution of `(?)` conditional directives.
//!
//! A conditional names an option and a set of labeled branches:
//!
//! ```text
//! (?):
//!   arch:
//!     x86_64:
//!       flags: -msse2
//!     (*):
//!       flags: -O2
//! ```
//!
//! Resolution substitutes the branch matching the option's value and
//! composes it over the conditional's sibling keys. Substituted content is
//! marked synthetic at its top level since it was placed by resolution
//! rather than written at that position.

use crate::composer::compose;
use crate::directive;
use bale_source_map::FileTable;
use bale_yaml::{LoadError, Node, Provenance, Result, Value};
use indexmap::IndexMap;

/// The option values a conditional may select on, by option name.
#[derive(Debug, Clone, Default)]
pub struct OptionValues {
    values: IndexMap<String, String>,
}

impl OptionValues {
    pub fn new() -> Self {
        OptionValues::default()
    }

    /// Set an option's value, replacing any previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for OptionValues {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut options = OptionValues::new();
        for (name, value) in iter {
            options.set(name, value);
        }
        options
    }
}

/// Recursively resolve every `(?)` conditional in `node` against
/// `options`. The returned tree contains no conditionals.
pub fn resolve_options(node: Node, options: &OptionValues, table: &FileTable) -> Result<Node> {
    let (value, src, overrides) = node.into_parts();
    match value {
        Value::Mapping(mut entries) => {
            let conditional = entries.shift_remove(directive::CONDITIONAL);

            let mut resolved = IndexMap::with_capacity(entries.len());
            for (key, child) in entries {
                resolved.insert(key, resolve_options(child, options, table)?);
            }
            let siblings = Node::from_parts(Value::Mapping(resolved), src, overrides);

            match conditional {
                None => Ok(siblings),
                Some(conditional) => substitute(siblings, conditional, options, table),
            }
        }
        Value::Sequence(items) => {
            let mut resolved = Vec::with_capacity(items.len());
            for item in items {
                resolved.push(resolve_options(item, options, table)?);
            }
            Ok(Node::from_parts(Value::Sequence(resolved), src, overrides))
        }
        scalar => Ok(Node::from_parts(scalar, src, overrides)),
    }
}

fn substitute(
    siblings: Node,
    conditional: Node,
    options: &OptionValues,
    table: &FileTable,
) -> Result<Node> {
    let conditional_prov = conditional.provenance(table);
    let (value, _, _) = conditional.into_parts();
    let Value::Mapping(cases) = value else {
        return Err(LoadError::Composition {
            provenance: conditional_prov,
            message: "conditional directive takes a mapping of option names".to_string(),
        });
    };

    let mut result = siblings;
    for (option_name, branches_node) in cases {
        tracing::debug!(option = %option_name, "resolving conditional");

        let branch = select_branch(&option_name, branches_node, options, &conditional_prov, table)?;
        let branch = resolve_options(branch, options, table)?;
        result = apply_branch(result, branch, table)?;
    }
    Ok(result)
}

fn select_branch(
    option_name: &str,
    branches_node: Node,
    options: &OptionValues,
    conditional_prov: &Provenance,
    table: &FileTable,
) -> Result<Node> {
    let branches_prov = branches_node.provenance(table);
    let (value, _, _) = branches_node.into_parts();
    let Value::Mapping(mut branches) = value else {
        return Err(LoadError::Composition {
            provenance: branches_prov,
            message: format!("conditional on option '{option_name}' takes labeled branches"),
        });
    };

    let Some(selected) = options.get(option_name) else {
        return Err(LoadError::UnresolvedOption {
            provenance: conditional_prov.clone(),
            message: format!("no value provided for option '{option_name}'"),
        });
    };

    if let Some(branch) = branches.shift_remove(selected) {
        return Ok(branch);
    }
    if let Some(branch) = branches.shift_remove(directive::DEFAULT_BRANCH) {
        return Ok(branch);
    }

    let declared: Vec<&str> = branches.keys().map(String::as_str).collect();
    Err(LoadError::UnresolvedOption {
        provenance: conditional_prov.clone(),
        message: format!(
            "option '{option_name}' is '{selected}', which matches none of [{}]",
            declared.join(", ")
        ),
    })
}

/// Compose a selected branch over the conditional's siblings. Mapping
/// branches merge entry by entry with the branch winning; a non-mapping
/// branch replaces the node outright and requires that there be no
/// sibling keys to silently discard.
fn apply_branch(siblings: Node, branch: Node, table: &FileTable) -> Result<Node> {
    let (value, branch_src, overrides) = branch.into_parts();
    match value {
        Value::Mapping(entries) => {
            let marked = entries
                .into_iter()
                .map(|(key, mut child)| {
                    child.mark_synthetic();
                    (key, child)
                })
                .collect();
            let branch = Node::from_parts(Value::Mapping(marked), branch_src, overrides);
            compose(siblings, branch, table)
        }
        other => {
            let mut branch = Node::from_parts(other, branch_src, overrides);
            match siblings.as_mapping() {
                Some(entries) if entries.is_empty() => {
                    branch.mark_synthetic();
                    branch.inherit_overrides(&siblings);
                    Ok(branch)
                }
                _ => Err(LoadError::Composition {
                    provenance: branch.provenance(table),
                    message: format!(
                        "a {} branch cannot replace a mapping that has other keys",
                        branch.kind()
                    ),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bale_yaml::parse;

    fn load(table: &mut FileTable, text: &str) -> Node {
        let id = table.add("/proj/conf.bale", "conf.bale", Some("proj"));
        parse(text, id, table).unwrap()
    }

    fn opts(pairs: &[(&str, &str)]) -> OptionValues {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_matching_branch_composes_over_siblings() {
        let mut table = FileTable::new();
        let doc = load(
            &mut table,
            "flags: -O2\n(?):\n  arch:\n    x86_64:\n      flags: -msse2\n",
        );

        let tree = resolve_options(doc, &opts(&[("arch", "x86_64")]), &table).unwrap();
        assert_eq!(tree.get::<&str>(&table, "flags", &[]).unwrap(), "-msse2");

        let prov = tree.provenance_at(&table, Some("flags"), &[]).unwrap();
        assert!(prov.is_synthetic);
        assert_eq!(prov.shortname, "conf.bale");
    }

    #[test]
    fn test_default_branch_used_when_no_label_matches() {
        let mut table = FileTable::new();
        let doc = load(
            &mut table,
            "(?):\n  arch:\n    x86_64:\n      flags: -msse2\n    (*):\n      flags: -O2\n",
        );

        let tree = resolve_options(doc, &opts(&[("arch", "riscv64")]), &table).unwrap();
        assert_eq!(tree.get::<&str>(&table, "flags", &[]).unwrap(), "-O2");
    }

    #[test]
    fn test_unmatched_value_without_default_fails() {
        let mut table = FileTable::new();
        let doc = load(
            &mut table,
            "k: 1\n(?):\n  flavor:\n    debug:\n      k: 2\n",
        );

        let err = resolve_options(doc, &opts(&[("flavor", "release")]), &table).unwrap_err();
        match err {
            LoadError::UnresolvedOption { provenance, message } => {
                assert_eq!(provenance.shortname, "conf.bale");
                assert_eq!(provenance.line, 2);
                assert!(message.contains("debug"));
            }
            other => panic!("expected UnresolvedOption, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_option_value_fails() {
        let mut table = FileTable::new();
        let doc = load(&mut table, "(?):\n  arch:\n    x86_64:\n      k: 1\n");

        let err = resolve_options(doc, &OptionValues::new(), &table).unwrap_err();
        match err {
            LoadError::UnresolvedOption { message, .. } => {
                assert!(message.contains("arch"));
            }
            other => panic!("expected UnresolvedOption, got {other:?}"),
        }
    }

    #[test]
    fn test_untouched_siblings_keep_provenance() {
        let mut table = FileTable::new();
        let doc = load(
            &mut table,
            "cc: gcc\n(?):\n  arch:\n    (*):\n      flags: -O2\n",
        );

        let tree = resolve_options(doc, &opts(&[("arch", "arm64")]), &table).unwrap();
        let cc = tree.provenance_at(&table, Some("cc"), &[]).unwrap();
        assert!(!cc.is_synthetic);
        assert_eq!(tree.keys(&table).unwrap(), vec!["cc", "flags"]);
    }

    #[test]
    fn test_nested_conditionals_resolve() {
        let mut table = FileTable::new();
        let doc = load(
            &mut table,
            "build:\n  (?):\n    flavor:\n      debug:\n        opt: 0\n      (*):\n        opt: 2\n",
        );

        let tree = resolve_options(doc, &opts(&[("flavor", "debug")]), &table).unwrap();
        assert_eq!(tree.get::<i64>(&table, "build", &["opt".into()]).unwrap(), 0);
    }

    #[test]
    fn test_conditional_inside_branch_resolves() {
        let mut table = FileTable::new();
        let doc = load(
            &mut table,
            "(?):\n  a:\n    on:\n      (?):\n        b:\n          on:\n            k: deep\n",
        );

        let tree = resolve_options(doc, &opts(&[("a", "on"), ("b", "on")]), &table).unwrap();
        assert_eq!(tree.get::<&str>(&table, "k", &[]).unwrap(), "deep");
    }

    #[test]
    fn test_scalar_branch_requires_empty_siblings() {
        let mut table = FileTable::new();
        let doc = load(&mut table, "k: 1\n(?):\n  m:\n    (*): scalar\n");

        let err = resolve_options(doc, &opts(&[("m", "x")]), &table).unwrap_err();
        assert!(matches!(err, LoadError::Composition { .. }));
    }

    #[test]
    fn test_option_values_last_write_wins() {
        let mut options = OptionValues::new();
        options.set("arch", "x86_64");
        options.set("arch", "arm64");
        assert_eq!(options.get("arch"), Some("arm64"));
    }
}
