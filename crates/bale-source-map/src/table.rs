//! The append-only file table for a loading session

use crate::types::FileId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One registered source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path on disk (or a caller-chosen identifier for in-memory
    /// documents).
    pub path: PathBuf,

    /// Project-relative display path, used in every user-facing message.
    pub shortname: String,

    /// Name of the project or toplevel document this file belongs to.
    ///
    /// This is a lookup relation, not an owning reference: the table never
    /// holds the project itself, only its name.
    pub project: Option<String>,
}

/// Registry of the files participating in one loading session.
///
/// The table is append-only: entries are registered as files are parsed and
/// never removed or reordered, so a [`FileId`] handed out once stays valid
/// for the whole session. Reads through `&FileTable` are safe from any
/// number of threads; registering a file requires `&mut` and therefore a
/// single writer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileTable {
    entries: Vec<FileEntry>,
}

impl FileTable {
    /// Create an empty table for a new loading session.
    pub fn new() -> Self {
        FileTable { entries: Vec::new() }
    }

    /// Register a file and return its id.
    pub fn add(
        &mut self,
        path: impl Into<PathBuf>,
        shortname: impl Into<String>,
        project: Option<&str>,
    ) -> FileId {
        let id = FileId(self.entries.len());
        self.entries.push(FileEntry {
            path: path.into(),
            shortname: shortname.into(),
            project: project.map(|p| p.to_string()),
        });
        id
    }

    /// Look up an entry by id.
    pub fn get(&self, id: FileId) -> Option<&FileEntry> {
        self.entries.get(id.0)
    }

    /// The display path for a file, or `"<unknown>"` for an id this table
    /// has never issued.
    pub fn shortname(&self, id: FileId) -> &str {
        self.get(id).map_or("<unknown>", |e| e.shortname.as_str())
    }

    /// The absolute path for a file, if registered.
    pub fn path(&self, id: FileId) -> Option<&Path> {
        self.get(id).map(|e| e.path.as_path())
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no files have been registered yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(id, entry)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (FileId, &FileEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (FileId(i), e))
    }
}
