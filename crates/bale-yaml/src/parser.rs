//! YAML-subset parser producing provenance-carrying node trees.
//!
//! Supports plain/quoted/block scalars, mappings, and sequences. Mapping
//! keys must be unique strings; anchors and aliases are rejected. The
//! first error aborts the parse of that file and no partial tree is
//! returned.

use crate::{LoadError, Node, Result, Scalar, SourceRef, Value};
use bale_source_map::{FileId, FileTable};
use indexmap::IndexMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Parse one document of `content`, attributing every value to `file`.
///
/// The file table is consulted only to render the file's display name in
/// syntax errors; `file` must have been registered in it by the caller.
/// An empty document parses to an empty mapping at line 1, column 1.
pub fn parse(content: &str, file: FileId, table: &FileTable) -> Result<Node> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = TreeBuilder::new(file, table);

    // false = first document only
    if let Err(scan) = parser.load(&mut builder, false) {
        // A builder-detected error is more precise than the scanner's
        // follow-on complaint.
        if let Some(err) = builder.error {
            return Err(err);
        }
        return Err(LoadError::Syntax {
            shortname: table.shortname(file).to_string(),
            line: scan.marker().line() as u32,
            column: scan.marker().col() as u32 + 1,
            message: scan.info().to_string(),
        });
    }

    if let Some(err) = builder.error {
        return Err(err);
    }

    Ok(builder
        .root
        .unwrap_or_else(|| Node::new(Value::Mapping(IndexMap::new()), SourceRef::real(file, 1, 1))))
}

/// Event receiver that assembles the node tree.
struct TreeBuilder<'t> {
    file: FileId,
    table: &'t FileTable,
    stack: Vec<BuildNode>,
    root: Option<Node>,
    /// First error encountered; once set, further events are ignored.
    error: Option<LoadError>,
}

enum BuildNode {
    Sequence {
        src: SourceRef,
        items: Vec<Node>,
    },
    Mapping {
        src: SourceRef,
        entries: IndexMap<String, Node>,
        /// Key waiting for its value.
        pending_key: Option<String>,
    },
}

impl<'t> TreeBuilder<'t> {
    fn new(file: FileId, table: &'t FileTable) -> Self {
        TreeBuilder {
            file,
            table,
            stack: Vec::new(),
            root: None,
            error: None,
        }
    }

    // Marker lines are already 1-based; columns are 0-based.
    fn src_at(&self, marker: &Marker) -> SourceRef {
        SourceRef::real(self.file, marker.line() as u32, marker.col() as u32 + 1)
    }

    fn fail(&mut self, marker: &Marker, message: String) {
        if self.error.is_none() {
            self.error = Some(LoadError::Syntax {
                shortname: self.table.shortname(self.file).to_string(),
                line: marker.line() as u32,
                column: marker.col() as u32 + 1,
                message,
            });
        }
    }

    /// True when the next event at the top of the stack would be a mapping
    /// key.
    fn expecting_key(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(BuildNode::Mapping { pending_key: None, .. })
        )
    }

    fn push_complete(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => self.root = Some(node),
            Some(BuildNode::Sequence { items, .. }) => items.push(node),
            Some(BuildNode::Mapping {
                entries,
                pending_key,
                ..
            }) => {
                // key-position events are intercepted before reaching here
                if let Some(key) = pending_key.take() {
                    entries.insert(key, node);
                }
            }
        }
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }

        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(value, style, _anchor_id, _tag) => {
                if self.expecting_key() {
                    let duplicate = match self.stack.last() {
                        Some(BuildNode::Mapping { entries, .. }) => entries.contains_key(&value),
                        _ => false,
                    };
                    if duplicate {
                        self.fail(&marker, format!("duplicate mapping key '{value}'"));
                        return;
                    }
                    if let Some(BuildNode::Mapping { pending_key, .. }) = self.stack.last_mut() {
                        *pending_key = Some(value);
                    }
                    return;
                }

                let scalar = match style {
                    TScalarStyle::Plain => infer_scalar(&value),
                    // quoted and block scalars are always strings
                    _ => Scalar::String(value),
                };
                let node = Node::new(Value::Scalar(scalar), self.src_at(&marker));
                self.push_complete(node);
            }

            Event::SequenceStart(_anchor_id, _tag) => {
                if self.expecting_key() {
                    self.fail(
                        &marker,
                        "sequences cannot be used as mapping keys".to_string(),
                    );
                    return;
                }
                self.stack.push(BuildNode::Sequence {
                    src: self.src_at(&marker),
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => {
                if let Some(BuildNode::Sequence { src, items }) = self.stack.pop() {
                    self.push_complete(Node::new(Value::Sequence(items), src));
                }
            }

            Event::MappingStart(_anchor_id, _tag) => {
                if self.expecting_key() {
                    self.fail(
                        &marker,
                        "mappings cannot be used as mapping keys".to_string(),
                    );
                    return;
                }
                self.stack.push(BuildNode::Mapping {
                    src: self.src_at(&marker),
                    entries: IndexMap::new(),
                    pending_key: None,
                });
            }

            Event::MappingEnd => {
                if let Some(BuildNode::Mapping {
                    src,
                    mut entries,
                    pending_key,
                }) = self.stack.pop()
                {
                    // a dangling key gets an explicit null value
                    if let Some(key) = pending_key {
                        entries.insert(key, Node::new(Value::Scalar(Scalar::Null), src));
                    }
                    self.push_complete(Node::new(Value::Mapping(entries), src));
                }
            }

            Event::Alias(_anchor_id) => {
                self.fail(&marker, "anchors and aliases are not supported".to_string());
            }
        }
    }
}

/// YAML 1.1 plain-scalar type inference.
///
/// Diverges from full YAML 1.1 number resolution in that hex/octal/
/// sexagesimal integer forms (`0x1A`, `0o17`, `1:30`) stay strings.
fn infer_scalar(value: &str) -> Scalar {
    if let Ok(i) = value.parse::<i64>() {
        return Scalar::Int(i);
    }

    if let Some(x) = infer_float(value) {
        return Scalar::Float(x);
    }

    match value {
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => {
            Scalar::Bool(true)
        }
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => {
            Scalar::Bool(false)
        }
        "null" | "Null" | "NULL" | "~" | "" => Scalar::Null,
        _ => Scalar::String(value.to_string()),
    }
}

/// Float forms per YAML 1.1: `.inf`/`.nan` spellings, not Rust's bare
/// `inf`/`nan` which `f64::from_str` would also accept.
fn infer_float(value: &str) -> Option<f64> {
    match value {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        _ => {
            let digits_only = value
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
            if digits_only { value.parse().ok() } else { None }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeKind;

    fn fixture(text: &str) -> (Result<Node>, FileTable) {
        let mut table = FileTable::new();
        let id = table.add("/proj/element.bale", "element.bale", Some("proj"));
        (parse(text, id, &table), table)
    }

    #[test]
    fn test_parse_scalar_kinds() {
        let (node, _) = fixture("a: word\nb: 42\nc: 2.5\nd: yes\ne: ~\n");
        let node = node.unwrap();

        let kinds: Vec<NodeKind> = node
            .as_mapping()
            .unwrap()
            .values()
            .map(Node::kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::String,
                NodeKind::Int,
                NodeKind::Float,
                NodeKind::Bool,
                NodeKind::Null
            ]
        );
    }

    #[test]
    fn test_quoted_scalars_stay_strings() {
        let (node, table) = fixture("a: '42'\nb: \"yes\"\n");
        let node = node.unwrap();
        assert_eq!(node.get::<&str>(&table, "a", &[]).unwrap(), "42");
        assert_eq!(node.get::<&str>(&table, "b", &[]).unwrap(), "yes");
    }

    #[test]
    fn test_float_inference_uses_yaml_spellings() {
        let (node, table) = fixture(
            "a: .inf\nb: -.inf\nc: .nan\nd: nan\ne: inf\nf: infinity\ng: 0x1A\n",
        );
        let node = node.unwrap();

        assert_eq!(node.get::<f64>(&table, "a", &[]).unwrap(), f64::INFINITY);
        assert_eq!(node.get::<f64>(&table, "b", &[]).unwrap(), f64::NEG_INFINITY);
        assert!(node.get::<f64>(&table, "c", &[]).unwrap().is_nan());

        // Rust float spellings and hex integers stay strings
        assert_eq!(node.get::<&str>(&table, "d", &[]).unwrap(), "nan");
        assert_eq!(node.get::<&str>(&table, "e", &[]).unwrap(), "inf");
        assert_eq!(node.get::<&str>(&table, "f", &[]).unwrap(), "infinity");
        assert_eq!(node.get::<&str>(&table, "g", &[]).unwrap(), "0x1A");
    }

    #[test]
    fn test_leaf_positions_match_source() {
        let (node, table) = fixture("kind: manual\ndescription: builds things\n");
        let node = node.unwrap();

        let kind = node.provenance_at(&table, Some("kind"), &[]).unwrap();
        assert_eq!((kind.line, kind.column), (1, 7));

        let desc = node.provenance_at(&table, Some("description"), &[]).unwrap();
        assert_eq!((desc.line, desc.column), (2, 14));
    }

    #[test]
    fn test_nested_structure_positions() {
        let (node, table) = fixture("deps:\n- name: a\n- name: b\n");
        let node = node.unwrap();

        let seq = node.provenance_at(&table, Some("deps"), &[]).unwrap();
        assert_eq!((seq.line, seq.column), (2, 1));

        let b = node
            .provenance_at(&table, Some("deps"), &[1usize.into(), "name".into()])
            .unwrap();
        assert_eq!((b.line, b.column), (3, 9));
    }

    #[test]
    fn test_block_scalar_position_at_start() {
        let (node, table) = fixture("script: |\n  echo one\n  echo two\n");
        let node = node.unwrap();

        let text = node.get::<&str>(&table, "script", &[]).unwrap();
        assert_eq!(text, "echo one\necho two\n");

        let prov = node.provenance_at(&table, Some("script"), &[]).unwrap();
        assert_eq!(prov.line, 1);
    }

    #[test]
    fn test_empty_document_is_empty_mapping() {
        let (node, _) = fixture("");
        let node = node.unwrap();
        assert!(node.is_mapping());
        assert!(node.as_mapping().unwrap().is_empty());
        assert_eq!((node.src().line, node.src().column), (1, 1));
        assert!(!node.src().synthetic);
    }

    #[test]
    fn test_duplicate_key_is_syntax_error() {
        let (result, _) = fixture("k: 1\nk: 2\n");
        match result.unwrap_err() {
            LoadError::Syntax { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("duplicate"));
            }
            other => panic!("expected Syntax, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_source_cites_position() {
        let (result, _) = fixture("k: [1, 2\n");
        match result.unwrap_err() {
            LoadError::Syntax { shortname, line, .. } => {
                assert_eq!(shortname, "element.bale");
                assert!(line >= 1);
            }
            other => panic!("expected Syntax, got {other:?}"),
        }
    }

    #[test]
    fn test_alias_rejected() {
        let (result, _) = fixture("a: &anchor 1\nb: *anchor\n");
        assert!(matches!(result.unwrap_err(), LoadError::Syntax { .. }));
    }

    #[test]
    fn test_complex_key_rejected() {
        let (result, _) = fixture("? [1, 2]\n: value\n");
        assert!(matches!(result.unwrap_err(), LoadError::Syntax { .. }));
    }

    #[test]
    fn test_key_order_preserved() {
        let (node, table) = fixture("z: 1\na: 2\nm: 3\n");
        assert_eq!(node.unwrap().keys(&table).unwrap(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_flow_collections() {
        let (node, table) = fixture("xs: [1, 2, 3]\nm: {a: 1}\n");
        let node = node.unwrap();
        assert_eq!(node.get::<i64>(&table, "xs", &[2usize.into()]).unwrap(), 3);
        assert_eq!(node.get::<i64>(&table, "m", &["a".into()]).unwrap(), 1);
    }
}
