//! Source provenance for nodes.
//!
//! Every node carries a compact [`SourceRef`] (file id, 1-based line and
//! column, synthetic flag). The human-facing [`Provenance`] is computed on
//! demand from a `SourceRef` plus the session's
//! [`FileTable`](bale_source_map::FileTable); nodes never hold the resolved
//! strings themselves.

use bale_source_map::{FileId, FileTable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compact source position stored on every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// File the value was read from; `None` only for values fabricated
    /// outside any document (e.g. a bare `set` on a synthetic tree).
    pub file: Option<FileId>,

    /// 1-based line of the value in source text.
    pub line: u32,

    /// 1-based column of the value in source text.
    pub column: u32,

    /// True when the value was fabricated by composition or option
    /// resolution rather than read verbatim from a file. The recorded
    /// position is then the nearest enclosing real location.
    pub synthetic: bool,
}

impl SourceRef {
    /// A value read verbatim from `file` at `line`:`column`.
    pub fn real(file: FileId, line: u32, column: u32) -> Self {
        SourceRef {
            file: Some(file),
            line,
            column,
            synthetic: false,
        }
    }

    /// A non-synthetic position with an optional file.
    pub fn real_at(file: Option<FileId>, line: u32, column: u32) -> Self {
        SourceRef {
            file,
            line,
            column,
            synthetic: false,
        }
    }

    /// A fabricated value with no source position at all.
    pub fn none() -> Self {
        SourceRef {
            file: None,
            line: 1,
            column: 1,
            synthetic: true,
        }
    }

    /// A fabricated value whose reported position is inherited from `base`.
    pub fn inferred_from(base: SourceRef) -> Self {
        SourceRef {
            synthetic: true,
            ..base
        }
    }
}

/// Human-readable provenance, resolved against the file table.
///
/// The display form is `shortname:line:column`, with ` (inferred)` appended
/// when the value is synthetic; for non-synthetic values line and column
/// match the literal source position exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Project-relative display path, or `"<synthetic>"` when the value has
    /// no originating file.
    pub shortname: String,

    /// Project/toplevel association from the file table, if any.
    pub project: Option<String>,

    pub line: u32,
    pub column: u32,

    /// True for values fabricated by composition or option resolution.
    pub is_synthetic: bool,
}

impl Provenance {
    /// Resolve a [`SourceRef`] against the file table.
    pub fn resolve(src: SourceRef, table: &FileTable) -> Self {
        // "<synthetic>" is reserved for refs with no file at all; a real
        // ref with an unregistered id renders the table's "<unknown>".
        let shortname = match src.file {
            None => "<synthetic>".to_string(),
            Some(id) => table.shortname(id).to_string(),
        };
        Provenance {
            shortname,
            project: src.file.and_then(|id| table.get(id)).and_then(|e| e.project.clone()),
            line: src.line,
            column: src.column,
            is_synthetic: src.synthetic,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.shortname, self.line, self.column)?;
        if self.is_synthetic {
            f.write_str(" (inferred)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_error_text_format() {
        let mut table = FileTable::new();
        let id = table.add("/proj/element.bale", "element.bale", Some("proj"));

        let prov = Provenance::resolve(SourceRef::real(id, 3, 7), &table);
        assert_eq!(prov.to_string(), "element.bale:3:7");
        assert!(!prov.is_synthetic);
        assert_eq!(prov.project.as_deref(), Some("proj"));
    }

    #[test]
    fn test_synthetic_display_is_flagged() {
        let mut table = FileTable::new();
        let id = table.add("/proj/element.bale", "element.bale", None);

        let src = SourceRef::inferred_from(SourceRef::real(id, 2, 1));
        let prov = Provenance::resolve(src, &table);
        assert_eq!(prov.to_string(), "element.bale:2:1 (inferred)");
        assert!(prov.is_synthetic);
    }

    #[test]
    fn test_unfiled_source_resolves_to_synthetic_name() {
        let table = FileTable::new();
        let prov = Provenance::resolve(SourceRef::none(), &table);
        assert_eq!(prov.shortname, "<synthetic>");
        assert!(prov.is_synthetic);
    }
}
