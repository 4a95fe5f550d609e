//! Provenance-carrying configuration trees for bale.
//!
//! This crate is the data model of the build-definition language: source
//! text is parsed into a [`Node`] tree in which every value records the
//! file, line, and column it came from, and all downstream consumers read
//! the tree through the typed accessor API on [`Node`].
//!
//! # Example
//!
//! ```rust
//! use bale_source_map::FileTable;
//! use bale_yaml::parse;
//!
//! let mut table = FileTable::new();
//! let id = table.add("/proj/element.bale", "element.bale", Some("proj"));
//!
//! let node = parse("kind: manual\n", id, &table).unwrap();
//! assert_eq!(node.get::<&str>(&table, "kind", &[]).unwrap(), "manual");
//!
//! let prov = node.provenance_at(&table, Some("kind"), &[]).unwrap();
//! assert_eq!(prov.to_string(), "element.bale:1:7");
//! ```

pub mod accessor;
pub mod error;
pub mod node;
pub mod parser;
pub mod provenance;

pub use accessor::{FromNode, PathSeg};
pub use error::{LoadError, Result};
pub use node::{Node, NodeKind, Scalar, Value};
pub use parser::parse;
pub use provenance::{Provenance, SourceRef};

// Re-export for convenience
pub use bale_source_map::{FileId, FileTable};
