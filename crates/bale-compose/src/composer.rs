//! Deterministic multi-document composition.
//!
//! Documents are folded in the caller-determined order; later documents
//! take precedence. Nested mappings merge key by key, scalars and
//! sequences are replaced wholesale unless a list directive says
//! otherwise, and every replaced value is demoted into the new value's
//! override chain. Given a fixed document order the result, including key
//! order, is reproducible.

use crate::directive;
use bale_source_map::FileTable;
use bale_yaml::{LoadError, Node, Provenance, Result, Scalar, SourceRef, Value};
use indexmap::IndexMap;

/// Include nesting bound; exceeding it means a cycle or pathological input.
const MAX_INCLUDE_DEPTH: usize = 64;

/// Resolves `(@)` include targets to parsed documents.
///
/// Implementations typically read the named file, register it in the file
/// table, and parse it. The provenance of the include directive is passed
/// through so resolver errors can cite its location.
pub trait IncludeResolver {
    fn resolve(
        &self,
        target: &str,
        provenance: &Provenance,
        table: &mut FileTable,
    ) -> Result<Node>;
}

/// Resolver for callers without include support: any `(@)` directive is a
/// composition error.
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve(
        &self,
        target: &str,
        provenance: &Provenance,
        _table: &mut FileTable,
    ) -> Result<Node> {
        Err(LoadError::Composition {
            provenance: provenance.clone(),
            message: format!("include of '{target}' is not supported by this loader"),
        })
    }
}

/// Fold an ordered sequence of parsed documents into one tree.
///
/// Per document: includes are expanded, option conditionals are resolved,
/// and the result is composed onto the accumulator. An empty document list
/// yields an empty synthetic mapping.
pub fn compose_documents(
    docs: Vec<Node>,
    resolver: &dyn IncludeResolver,
    options: &crate::OptionValues,
    table: &mut FileTable,
) -> Result<Node> {
    tracing::debug!(documents = docs.len(), "composing document set");

    let mut acc = Node::new(Value::Mapping(IndexMap::new()), SourceRef::none());
    for doc in docs {
        let doc = expand_includes(doc, resolver, table)?;
        let doc = crate::resolve_options(doc, options, table)?;
        acc = compose(acc, doc, table)?;
    }
    Ok(acc)
}

/// Compose `overlay` over `base`. Both must be mappings.
pub fn compose(base: Node, overlay: Node, table: &FileTable) -> Result<Node> {
    if !base.is_mapping() {
        return Err(LoadError::Composition {
            provenance: base.provenance(table),
            message: format!("cannot compose onto a {}", base.kind()),
        });
    }
    if !overlay.is_mapping() {
        return Err(LoadError::Composition {
            provenance: overlay.provenance(table),
            message: format!("composed documents must be mappings, found {}", overlay.kind()),
        });
    }
    compose_mappings(base, overlay, table)
}

fn compose_mappings(base: Node, overlay: Node, table: &FileTable) -> Result<Node> {
    let (base_value, base_src, base_overrides) = base.into_parts();
    let (overlay_value, overlay_src, _) = overlay.into_parts();
    let (Value::Mapping(mut entries), Value::Mapping(incoming)) = (base_value, overlay_value)
    else {
        return Err(LoadError::Composition {
            provenance: Provenance::resolve(base_src, table),
            message: "cannot deep-merge non-mappings".to_string(),
        });
    };

    for (key, value) in incoming {
        merge_entry(&mut entries, key, value, table)?;
    }

    // the accumulator adopts the first real document's root position
    let src = if base_src.synthetic && !overlay_src.synthetic {
        overlay_src
    } else {
        base_src
    };
    Ok(Node::from_parts(Value::Mapping(entries), src, base_overrides))
}

fn merge_entry(
    entries: &mut IndexMap<String, Node>,
    key: String,
    incoming: Node,
    table: &FileTable,
) -> Result<()> {
    if key == directive::INCLUDE {
        return Err(LoadError::Composition {
            provenance: incoming.provenance(table),
            message: "include directives must be expanded before composition".to_string(),
        });
    }
    if directive::is_directive(&key) && key != directive::CONDITIONAL {
        return Err(LoadError::Composition {
            provenance: incoming.provenance(table),
            message: format!("directive '{key}' has no target key here"),
        });
    }

    if let Some(d) = directive::value_directive(&incoming) {
        return apply_directive(entries, key, d, incoming, table);
    }

    match entries.get_mut(&key) {
        Some(slot) if slot.is_mapping() && incoming.is_mapping() => {
            let existing = std::mem::replace(slot, placeholder());
            *slot = compose_mappings(existing, incoming, table)?;
        }
        Some(slot) => {
            // wholesale replacement, demoting the old value's position
            let mut incoming = normalize_unless_conditional(&key, incoming, table)?;
            incoming.inherit_overrides(slot);
            *slot = incoming;
        }
        None => {
            let incoming = normalize_unless_conditional(&key, incoming, table)?;
            entries.insert(key, incoming);
        }
    }
    Ok(())
}

/// Conditional payloads carry their branches verbatim until the
/// option-resolution pass composes them; everything else entering the
/// result without a base is normalized.
fn normalize_unless_conditional(key: &str, incoming: Node, table: &FileTable) -> Result<Node> {
    if key == directive::CONDITIONAL {
        Ok(incoming)
    } else {
        normalize(incoming, table)
    }
}

/// Rewrite a subtree entering the result with no base to merge against, so
/// that value directives nested inside it still apply (as if composed over
/// an empty mapping) rather than surviving as literal keys. Conditional
/// entries pass through untouched for the option-resolution pass.
fn normalize(node: Node, table: &FileTable) -> Result<Node> {
    let (value, src, overrides) = node.into_parts();
    match value {
        Value::Mapping(entries) => {
            let mut normalized = IndexMap::with_capacity(entries.len());
            for (key, child) in entries {
                merge_entry(&mut normalized, key, child, table)?;
            }
            Ok(Node::from_parts(Value::Mapping(normalized), src, overrides))
        }
        Value::Sequence(items) => {
            let mut normalized = Vec::with_capacity(items.len());
            for item in items {
                normalized.push(normalize(item, table)?);
            }
            Ok(Node::from_parts(Value::Sequence(normalized), src, overrides))
        }
        scalar => Ok(Node::from_parts(scalar, src, overrides)),
    }
}

fn apply_directive(
    entries: &mut IndexMap<String, Node>,
    key: String,
    d: &'static str,
    incoming: Node,
    table: &FileTable,
) -> Result<()> {
    let incoming_prov = incoming.provenance(table);
    let (value, _, _) = incoming.into_parts();
    let Value::Mapping(mut directive_entries) = value else {
        return Err(LoadError::Composition {
            provenance: incoming_prov,
            message: format!("directive '{d}' must be spelled as a mapping"),
        });
    };
    if directive_entries.len() != 1 {
        return Err(LoadError::Composition {
            provenance: incoming_prov,
            message: format!("directive '{d}' must be the only key of its mapping"),
        });
    }
    // sole entry, guaranteed present
    let inner = match directive_entries.shift_remove(d) {
        Some(inner) => inner,
        None => {
            return Err(LoadError::Composition {
                provenance: incoming_prov,
                message: format!("directive '{d}' must be the only key of its mapping"),
            });
        }
    };

    match d {
        directive::OVERRIDE => {
            let mut new = normalize(inner, table)?;
            if let Some(old) = entries.get(&key) {
                new.inherit_overrides(old);
            }
            entries.insert(key, new);
            Ok(())
        }
        directive::DELETE => {
            entries.shift_remove(&key);
            Ok(())
        }
        _ => apply_list_directive(entries, key, d, inner, table),
    }
}

fn apply_list_directive(
    entries: &mut IndexMap<String, Node>,
    key: String,
    d: &'static str,
    inner: Node,
    table: &FileTable,
) -> Result<()> {
    let inner = normalize(inner, table)?;
    let inner_src = inner.src();
    let (inner_value, _, _) = inner.into_parts();
    let Value::Sequence(incoming_items) = inner_value else {
        return Err(LoadError::Composition {
            provenance: Provenance::resolve(inner_src, table),
            message: format!("directive '{d}' takes a sequence"),
        });
    };

    let existing = entries
        .get_mut(&key)
        .map(|slot| std::mem::replace(slot, placeholder()));

    let (existing_items, chain) = match existing {
        None => (Vec::new(), Vec::new()),
        Some(node) => {
            let kind = node.kind();
            let (value, src, overrides) = node.into_parts();
            let Value::Sequence(items) = value else {
                return Err(LoadError::Composition {
                    provenance: Provenance::resolve(src, table),
                    message: format!(
                        "directive '{d}' on key '{key}' targets a {kind}, not a sequence"
                    ),
                });
            };
            let mut chain = vec![src];
            chain.extend(overrides);
            (items, chain)
        }
    };

    let items = match d {
        directive::LIST_APPEND => {
            let mut items = existing_items;
            items.extend(incoming_items);
            items
        }
        directive::LIST_PREPEND => {
            let mut items = incoming_items;
            items.extend(existing_items);
            items
        }
        // LIST_OVERWRITE
        _ => incoming_items,
    };

    // the combined container is fabricated by composition; each element
    // keeps the provenance of its origin document
    let node = Node::from_parts(
        Value::Sequence(items),
        SourceRef::inferred_from(inner_src),
        chain,
    );
    entries.insert(key, node);
    Ok(())
}

/// Recursively expand `(@)` include directives.
///
/// The included documents compose in listed order to form the base; the
/// enclosing mapping's remaining keys then compose over it, so siblings of
/// the include take precedence.
pub fn expand_includes(
    node: Node,
    resolver: &dyn IncludeResolver,
    table: &mut FileTable,
) -> Result<Node> {
    expand_rec(node, resolver, table, 0)
}

fn expand_rec(
    node: Node,
    resolver: &dyn IncludeResolver,
    table: &mut FileTable,
    depth: usize,
) -> Result<Node> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(LoadError::Composition {
            provenance: node.provenance(table),
            message: format!("include nesting exceeds {MAX_INCLUDE_DEPTH} levels"),
        });
    }

    let (value, src, overrides) = node.into_parts();
    match value {
        Value::Mapping(mut entries) => {
            let include = entries.shift_remove(directive::INCLUDE);

            let mut expanded = IndexMap::with_capacity(entries.len());
            for (key, child) in entries {
                expanded.insert(key, expand_rec(child, resolver, table, depth)?);
            }
            let remainder = Node::from_parts(Value::Mapping(expanded), src, overrides);

            let Some(include_node) = include else {
                return Ok(remainder);
            };

            let include_prov = include_node.provenance(table);
            let targets = include_targets(&include_node, table)?;

            let mut base: Option<Node> = None;
            for target in targets {
                tracing::debug!(target = %target, "expanding include");
                let included = resolver.resolve(&target, &include_prov, table)?;
                let included = expand_rec(included, resolver, table, depth + 1)?;
                if !included.is_mapping() {
                    return Err(LoadError::Composition {
                        provenance: included.provenance(table),
                        message: format!("included document '{target}' must be a mapping"),
                    });
                }
                base = Some(match base {
                    None => included,
                    Some(prev) => compose(prev, included, table)?,
                });
            }

            match base {
                None => Ok(remainder),
                Some(base) => compose(base, remainder, table),
            }
        }
        Value::Sequence(items) => {
            let mut expanded = Vec::with_capacity(items.len());
            for item in items {
                expanded.push(expand_rec(item, resolver, table, depth)?);
            }
            Ok(Node::from_parts(Value::Sequence(expanded), src, overrides))
        }
        scalar => Ok(Node::from_parts(scalar, src, overrides)),
    }
}

fn include_targets(include_node: &Node, table: &FileTable) -> Result<Vec<String>> {
    match include_node.value() {
        Value::Scalar(Scalar::String(target)) => Ok(vec![target.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item.value() {
                Value::Scalar(Scalar::String(target)) => Ok(target.clone()),
                _ => Err(LoadError::Composition {
                    provenance: item.provenance(table),
                    message: "include targets must be strings".to_string(),
                }),
            })
            .collect(),
        _ => Err(LoadError::Composition {
            provenance: include_node.provenance(table),
            message: "include directive takes a filename or a list of filenames".to_string(),
        }),
    }
}

fn placeholder() -> Node {
    Node::new(Value::Scalar(Scalar::Null), SourceRef::none())
}
