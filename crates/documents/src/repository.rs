use async_trait::async_trait;

use folio_core::{DocumentId, InfrastructureError};

use crate::document::{Document, DocumentQuery, DocumentVersion};
use crate::error::VersioningError;

/// Mutation applied to a locked document row.
///
/// Returns the snapshot to append, if the edit produced one. An `Err` aborts
/// the edit and nothing is written.
pub type EditFn = dyn Fn(&mut Document) -> Result<Option<DocumentVersion>, VersioningError> + Send + Sync;

/// Persistence for documents and their version history.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Store a new document with its first snapshot, atomically.
    ///
    /// Fails with `DuplicateStage` when the (project, stage) pair is taken.
    async fn insert(&self, document: Document, initial: DocumentVersion) -> Result<(), VersioningError>;

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, InfrastructureError>;

    /// Matching documents, most recently updated first.
    async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>, InfrastructureError>;

    /// History, newest first.
    async fn versions(&self, id: DocumentId) -> Result<Vec<DocumentVersion>, InfrastructureError>;

    /// Latest snapshot carrying `version`.
    async fn find_version(&self, id: DocumentId, version: u32) -> Result<Option<DocumentVersion>, InfrastructureError>;

    /// Lock the document, apply `edit`, append the returned snapshot (if any)
    /// and persist the document, all in one transaction.
    ///
    /// Concurrent edits to the same document serialize here.
    async fn commit_edit(&self, id: DocumentId, edit: &EditFn) -> Result<Document, VersioningError>;

    /// Remove the document and its history. Returns `false` if it was absent.
    async fn delete(&self, id: DocumentId) -> Result<bool, InfrastructureError>;
}
