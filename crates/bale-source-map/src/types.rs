//! Core types for source tracking

use serde::{Deserialize, Serialize};

/// A unique identifier for a source file within one loading session.
///
/// The id is an index into the session's [`crate::FileTable`]. Nodes store
/// this index rather than a reference to the entry, so a node can outlive
/// nothing it shouldn't and the table stays append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub usize);
