//! Error taxonomy for parsing, access, and composition.
//!
//! Every variant carries the offending node's provenance when one exists,
//! and renders as `shortname:line:column: message` so calling layers (CLI
//! error reporting in particular) can pass the text straight through. The
//! first error aborts the current parse or compose; recovery policy belongs
//! to callers.

use crate::Provenance;
use thiserror::Error;

/// Result type alias for bale loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoadError {
    /// Malformed source text. Aborts the parse of that file; no partial
    /// tree is returned.
    #[error("{shortname}:{line}:{column}: {message}")]
    Syntax {
        shortname: String,
        line: u32,
        column: u32,
        message: String,
    },

    /// An accessor or mutator was used against the wrong container or
    /// scalar kind.
    #[error("{provenance}: {message}")]
    WrongType {
        provenance: Provenance,
        message: String,
    },

    /// A mapping key in the requested path does not exist and no default
    /// was supplied. The provenance is the innermost container reached.
    #[error("{provenance}: {message}")]
    MissingKey {
        provenance: Provenance,
        message: String,
    },

    /// A sequence index in the requested path is out of bounds.
    #[error("{provenance}: {message}")]
    BadIndex {
        provenance: Provenance,
        message: String,
    },

    /// Directive misuse during composition, e.g. a list directive
    /// targeting a non-sequence.
    #[error("{provenance}: {message}")]
    Composition {
        provenance: Provenance,
        message: String,
    },

    /// An option conditional could not select a branch.
    #[error("{provenance}: {message}")]
    UnresolvedOption {
        provenance: Provenance,
        message: String,
    },
}

impl LoadError {
    /// The provenance attached to this error, when one exists.
    pub fn provenance(&self) -> Option<&Provenance> {
        match self {
            LoadError::Syntax { .. } => None,
            LoadError::WrongType { provenance, .. }
            | LoadError::MissingKey { provenance, .. }
            | LoadError::BadIndex { provenance, .. }
            | LoadError::Composition { provenance, .. }
            | LoadError::UnresolvedOption { provenance, .. } => Some(provenance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_text_format() {
        let err = LoadError::Syntax {
            shortname: "element.bale".to_string(),
            line: 4,
            column: 2,
            message: "mapping values are not allowed here".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "element.bale:4:2: mapping values are not allowed here"
        );
    }

    #[test]
    fn test_provenance_accessor() {
        let prov = Provenance {
            shortname: "a.bale".to_string(),
            project: None,
            line: 1,
            column: 1,
            is_synthetic: false,
        };
        let err = LoadError::MissingKey {
            provenance: prov.clone(),
            message: "no key 'depends'".to_string(),
        };
        assert_eq!(err.provenance(), Some(&prov));
        assert_eq!(err.to_string(), "a.bale:1:1: no key 'depends'");
    }
}
