//! Composition of parsed configuration documents.
//!
//! Builds on [`bale_yaml`] trees: an ordered set of documents is folded
//! into a single tree by deep-merging mappings, applying the reserved
//! directive keys (`(@)` includes, list splices, `(!)` override, `(-)`
//! delete), and resolving `(?)` option conditionals. Every value in the
//! composed tree keeps the provenance of the document that supplied it,
//! and values shadowed along the way are retained in override chains for
//! diagnostics.
//!
//! The usual entry point is [`compose_documents`]; the individual passes
//! ([`expand_includes`], [`resolve_options`], [`compose`]) are exposed for
//! callers that need finer control.

pub mod composer;
pub mod directive;
pub mod options;

pub use composer::{IncludeResolver, NoIncludes, compose, compose_documents, expand_includes};
pub use options::{OptionValues, resolve_options};
