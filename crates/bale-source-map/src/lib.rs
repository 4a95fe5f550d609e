//! Source file registry and location lookups for bale.
//!
//! Every node in a composed configuration tree references its originating
//! file through a [`FileId`] into a [`FileTable`]. The table is the explicit
//! loading-session object: it is created for one load, appended to as files
//! are parsed, and discarded when the session ends. Nodes never hold strong
//! pointers to file data, so trees and the table cannot form ownership
//! cycles.
//!
//! # Example
//!
//! ```rust
//! use bale_source_map::FileTable;
//!
//! let mut table = FileTable::new();
//! let id = table.add("/work/project/element.bale", "element.bale", Some("project"));
//! assert_eq!(table.shortname(id), "element.bale");
//! ```

pub mod table;
pub mod types;

pub use table::{FileEntry, FileTable};
pub use types::FileId;
