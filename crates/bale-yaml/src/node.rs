//! The configuration node tree.
//!
//! A [`Node`] is a tagged value (scalar, mapping, or sequence) plus the
//! source position it was read from. Mappings and sequences exclusively own
//! their children; nothing in a tree points back at its parent or at the
//! owning document, so trees are plain acyclic ownership.
//!
//! Nodes are immutable by default: the only mutation path is
//! [`Node::set`](crate::Node::set), which records the replaced value's
//! position in the new value's override chain.

use crate::SourceRef;
use indexmap::IndexMap;
use std::fmt;

/// A scalar leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

/// The payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    /// Ordered mapping with unique string keys; insertion order is
    /// significant and survives composition.
    Mapping(IndexMap<String, Node>),
    Sequence(Vec<Node>),
}

/// Runtime shape of a node, for callers that only know the expected shape
/// dynamically (schema-driven reads).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Mapping,
    Sequence,
    String,
    Int,
    Float,
    Bool,
    Null,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
            NodeKind::String => "string",
            NodeKind::Int => "integer",
            NodeKind::Float => "float",
            NodeKind::Bool => "boolean",
            NodeKind::Null => "null",
        };
        f.write_str(name)
    }
}

/// A value with attached source provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    value: Value,
    src: SourceRef,
    /// Positions of the values this node replaced, most recent first.
    /// Diagnostics only; never consulted during value resolution.
    overrides: Vec<SourceRef>,
}

impl Node {
    /// Create a node with no override history.
    pub fn new(value: Value, src: SourceRef) -> Self {
        Node {
            value,
            src,
            overrides: Vec::new(),
        }
    }

    /// Reassemble a node from its parts. Counterpart of [`Node::into_parts`].
    pub fn from_parts(value: Value, src: SourceRef, overrides: Vec<SourceRef>) -> Self {
        Node {
            value,
            src,
            overrides,
        }
    }

    /// Decompose into `(value, src, overrides)`, consuming the node.
    pub fn into_parts(self) -> (Value, SourceRef, Vec<SourceRef>) {
        (self.value, self.src, self.overrides)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub(crate) fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn src(&self) -> SourceRef {
        self.src
    }

    /// The override chain: positions of replaced values, most recent first.
    pub fn overrides(&self) -> &[SourceRef] {
        &self.overrides
    }

    pub fn kind(&self) -> NodeKind {
        match &self.value {
            Value::Mapping(_) => NodeKind::Mapping,
            Value::Sequence(_) => NodeKind::Sequence,
            Value::Scalar(Scalar::String(_)) => NodeKind::String,
            Value::Scalar(Scalar::Int(_)) => NodeKind::Int,
            Value::Scalar(Scalar::Float(_)) => NodeKind::Float,
            Value::Scalar(Scalar::Bool(_)) => NodeKind::Bool,
            Value::Scalar(Scalar::Null) => NodeKind::Null,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.value, Value::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.value, Value::Sequence(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.value, Value::Scalar(_))
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Node>> {
        match &self.value {
            Value::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.value {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.value {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Mark this node as fabricated rather than read verbatim from a file,
    /// keeping the recorded position as the nearest real location.
    pub fn mark_synthetic(&mut self) {
        self.src.synthetic = true;
    }

    /// Record that this node replaced `replaced`: the replaced value's own
    /// position and its prior chain are appended, most recent first.
    pub fn inherit_overrides(&mut self, replaced: &Node) {
        self.overrides.push(replaced.src);
        self.overrides.extend_from_slice(&replaced.overrides);
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::String(s))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Int(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(Scalar::Float(x))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}
