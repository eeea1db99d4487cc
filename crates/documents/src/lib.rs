//! `folio-documents`: stage documents and their version history.
//!
//! Storage is behind [`DocumentRepository`]; the manager owns the versioning
//! rules and never talks to a database directly.

pub mod document;
pub mod error;
pub mod manager;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

pub use document::{
    Document, DocumentChanges, DocumentFormat, DocumentQuery, DocumentStatus, DocumentVersion, NewDocument, Stage,
};
pub use error::VersioningError;
pub use manager::DocumentVersionManager;
pub use repository::{DocumentRepository, EditFn};
