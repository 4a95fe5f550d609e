//! Typed, validated access to node trees.
//!
//! Paths are a leading mapping key followed by further segments (mapping
//! keys or sequence indices). Reads validate the resolved value's shape;
//! a mismatch is a `WrongType` error citing the mismatched node, and an
//! unresolvable path is a `MissingKey`/`BadIndex` error citing the
//! innermost container actually reached.
//!
//! All read accessors take `&self` and are safe to call concurrently once
//! a tree is built. `set` takes `&mut self`; callers are responsible for
//! single-writer discipline on a given tree.

use crate::{LoadError, Node, NodeKind, Provenance, Result, Scalar, SourceRef, Value};
use bale_source_map::FileTable;

/// One path segment after the leading key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSeg<'a> {
    Key(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for PathSeg<'a> {
    fn from(key: &'a str) -> Self {
        PathSeg::Key(key)
    }
}

impl From<usize> for PathSeg<'_> {
    fn from(index: usize) -> Self {
        PathSeg::Index(index)
    }
}

/// Compile-time typed extraction from a resolved node.
///
/// Implemented for the scalar payload types plus `&Node` itself. Callers
/// that only know the expected shape at runtime use
/// [`Node::get_node`] with a [`NodeKind`] instead; both paths preserve the
/// same wrong-shape error contract.
pub trait FromNode<'a>: Sized {
    /// Shape name used in wrong-type messages.
    fn expected() -> &'static str;

    fn from_node(node: &'a Node) -> Option<Self>;
}

impl<'a> FromNode<'a> for &'a str {
    fn expected() -> &'static str {
        "string"
    }

    fn from_node(node: &'a Node) -> Option<Self> {
        match node.value() {
            Value::Scalar(Scalar::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl FromNode<'_> for String {
    fn expected() -> &'static str {
        "string"
    }

    fn from_node(node: &Node) -> Option<Self> {
        <&str>::from_node(node).map(|s| s.to_string())
    }
}

impl FromNode<'_> for i64 {
    fn expected() -> &'static str {
        "integer"
    }

    fn from_node(node: &Node) -> Option<Self> {
        match node.value() {
            Value::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }
}

impl FromNode<'_> for f64 {
    fn expected() -> &'static str {
        "float"
    }

    // An integer literal satisfies a float read.
    fn from_node(node: &Node) -> Option<Self> {
        match node.value() {
            Value::Scalar(Scalar::Float(x)) => Some(*x),
            Value::Scalar(Scalar::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromNode<'_> for bool {
    fn expected() -> &'static str {
        "boolean"
    }

    fn from_node(node: &Node) -> Option<Self> {
        match node.value() {
            Value::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

impl<'a> FromNode<'a> for &'a Node {
    fn expected() -> &'static str {
        "node"
    }

    fn from_node(node: &'a Node) -> Option<Self> {
        Some(node)
    }
}

impl Node {
    /// Resolve `key` then `indices` and extract a typed value.
    pub fn get<'a, T: FromNode<'a>>(
        &'a self,
        table: &FileTable,
        key: &str,
        indices: &[PathSeg],
    ) -> Result<T> {
        let node = self.resolve(table, key, indices)?;
        extract(node, table)
    }

    /// Like [`Node::get`], but an unresolvable path yields `default`
    /// instead of an error. A resolved value of the wrong shape still
    /// fails.
    pub fn get_or<'a, T: FromNode<'a>>(
        &'a self,
        table: &FileTable,
        key: &str,
        indices: &[PathSeg],
        default: T,
    ) -> Result<T> {
        match self.resolve(table, key, indices) {
            Ok(node) => extract(node, table),
            Err(LoadError::MissingKey { .. } | LoadError::BadIndex { .. }) => Ok(default),
            Err(e) => Err(e),
        }
    }

    /// Like [`Node::get`], but an unresolvable path or an explicit null
    /// yields `None`.
    pub fn get_opt<'a, T: FromNode<'a>>(
        &'a self,
        table: &FileTable,
        key: &str,
        indices: &[PathSeg],
    ) -> Result<Option<T>> {
        match self.resolve(table, key, indices) {
            Ok(node) if matches!(node.value(), Value::Scalar(Scalar::Null)) => Ok(None),
            Ok(node) => extract(node, table).map(Some),
            Err(LoadError::MissingKey { .. } | LoadError::BadIndex { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve a path and validate the node's runtime shape against an
    /// expected [`NodeKind`], for schema-driven readers.
    pub fn get_node(
        &self,
        table: &FileTable,
        kind: NodeKind,
        key: &str,
        indices: &[PathSeg],
    ) -> Result<&Node> {
        let node = self.resolve(table, key, indices)?;
        if node.kind() == kind {
            Ok(node)
        } else {
            Err(LoadError::WrongType {
                provenance: node.provenance(table),
                message: format!("expected {kind}, found {}", node.kind()),
            })
        }
    }

    /// Write `value` at the addressed location, creating or replacing the
    /// entry. The final container must already exist. A replaced value's
    /// position is demoted into the new value's override chain; the new
    /// value itself is synthetic, positioned at its enclosing container.
    pub fn set(
        &mut self,
        table: &FileTable,
        key: &str,
        value: impl Into<Value>,
        indices: &[PathSeg],
    ) -> Result<()> {
        let value = value.into();

        let mut current: &mut Node = self;
        let last = match indices.split_last() {
            Some((last, init)) => {
                current = step_key_mut(current, key, table)?;
                for seg in init {
                    current = step_mut(current, *seg, table)?;
                }
                *last
            }
            None => PathSeg::Key(key),
        };

        let container_src = current.src();
        let container_prov = current.provenance(table);
        let mut new = Node::new(value, SourceRef::inferred_from(container_src));

        match (current.value_mut(), last) {
            (Value::Mapping(entries), PathSeg::Key(k)) => {
                if let Some(old) = entries.get(k) {
                    new.inherit_overrides(old);
                }
                // IndexMap keeps the original position for existing keys,
                // so untouched key order never changes.
                entries.insert(k.to_string(), new);
                Ok(())
            }
            (Value::Sequence(items), PathSeg::Index(i)) => match items.get_mut(i) {
                Some(slot) => {
                    new.inherit_overrides(slot);
                    *slot = new;
                    Ok(())
                }
                None => Err(LoadError::BadIndex {
                    provenance: container_prov,
                    message: format!(
                        "sequence index {i} out of bounds (length {})",
                        items.len()
                    ),
                }),
            },
            (_, PathSeg::Key(k)) => Err(LoadError::WrongType {
                provenance: container_prov,
                message: format!("cannot write key '{k}' into a non-mapping"),
            }),
            (_, PathSeg::Index(i)) => Err(LoadError::WrongType {
                provenance: container_prov,
                message: format!("cannot write index {i} into a non-sequence"),
            }),
        }
    }

    /// Ordered mapping keys, in first-insertion/composition order.
    pub fn keys(&self, table: &FileTable) -> Result<Vec<&str>> {
        match self.value() {
            Value::Mapping(entries) => Ok(entries.keys().map(String::as_str).collect()),
            _ => Err(LoadError::WrongType {
                provenance: self.provenance(table),
                message: format!("expected mapping, found {}", self.kind()),
            }),
        }
    }

    /// Provenance of this node.
    pub fn provenance(&self, table: &FileTable) -> Provenance {
        Provenance::resolve(self.src(), table)
    }

    /// Provenance of the node addressed by an optional path.
    pub fn provenance_at(
        &self,
        table: &FileTable,
        key: Option<&str>,
        indices: &[PathSeg],
    ) -> Result<Provenance> {
        let mut current = self;
        if let Some(key) = key {
            current = step_key(current, key, table)?;
        }
        for seg in indices {
            current = step(current, *seg, table)?;
        }
        Ok(current.provenance(table))
    }

    /// Provenances of the values this node replaced, most recent first.
    pub fn override_provenances(&self, table: &FileTable) -> Vec<Provenance> {
        self.overrides()
            .iter()
            .map(|src| Provenance::resolve(*src, table))
            .collect()
    }

    fn resolve<'a>(
        &'a self,
        table: &FileTable,
        key: &str,
        indices: &[PathSeg],
    ) -> Result<&'a Node> {
        let mut current = step_key(self, key, table)?;
        for seg in indices {
            current = step(current, *seg, table)?;
        }
        Ok(current)
    }
}

fn extract<'a, T: FromNode<'a>>(node: &'a Node, table: &FileTable) -> Result<T> {
    T::from_node(node).ok_or_else(|| LoadError::WrongType {
        provenance: node.provenance(table),
        message: format!("expected {}, found {}", T::expected(), node.kind()),
    })
}

fn step<'a>(node: &'a Node, seg: PathSeg, table: &FileTable) -> Result<&'a Node> {
    match seg {
        PathSeg::Key(key) => step_key(node, key, table),
        PathSeg::Index(index) => step_index(node, index, table),
    }
}

fn step_key<'a>(node: &'a Node, key: &str, table: &FileTable) -> Result<&'a Node> {
    match node.value() {
        Value::Mapping(entries) => entries.get(key).ok_or_else(|| LoadError::MissingKey {
            provenance: node.provenance(table),
            message: format!("mapping does not contain key '{key}'"),
        }),
        _ => Err(LoadError::WrongType {
            provenance: node.provenance(table),
            message: format!("cannot look up key '{key}' in {}", node.kind()),
        }),
    }
}

fn step_index<'a>(node: &'a Node, index: usize, table: &FileTable) -> Result<&'a Node> {
    match node.value() {
        Value::Sequence(items) => items.get(index).ok_or_else(|| LoadError::BadIndex {
            provenance: node.provenance(table),
            message: format!("sequence index {index} out of bounds (length {})", items.len()),
        }),
        _ => Err(LoadError::WrongType {
            provenance: node.provenance(table),
            message: format!("cannot index {} with {index}", node.kind()),
        }),
    }
}

fn step_mut<'a>(node: &'a mut Node, seg: PathSeg, table: &FileTable) -> Result<&'a mut Node> {
    match seg {
        PathSeg::Key(key) => step_key_mut(node, key, table),
        PathSeg::Index(index) => {
            let provenance = node.provenance(table);
            let kind = node.kind();
            match node.value_mut() {
                Value::Sequence(items) => {
                    let len = items.len();
                    items.get_mut(index).ok_or_else(|| LoadError::BadIndex {
                        provenance,
                        message: format!("sequence index {index} out of bounds (length {len})"),
                    })
                }
                _ => Err(LoadError::WrongType {
                    provenance,
                    message: format!("cannot index {kind} with {index}"),
                }),
            }
        }
    }
}

fn step_key_mut<'a>(node: &'a mut Node, key: &str, table: &FileTable) -> Result<&'a mut Node> {
    let provenance = node.provenance(table);
    let kind = node.kind();
    match node.value_mut() {
        Value::Mapping(entries) => entries.get_mut(key).ok_or_else(|| LoadError::MissingKey {
            provenance,
            message: format!("mapping does not contain key '{key}'"),
        }),
        _ => Err(LoadError::WrongType {
            provenance,
            message: format!("cannot look up key '{key}' in {kind}"),
        }),
    }
}
