use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use folio_core::{DocumentId, InfrastructureError};

use crate::document::{Document, DocumentQuery, DocumentVersion};
use crate::error::VersioningError;
use crate::repository::{DocumentRepository, EditFn};

#[derive(Default)]
struct State {
    documents: HashMap<DocumentId, Document>,
    versions: Vec<DocumentVersion>,
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

#[async_trait]
impl DocumentRepository for MemoryRepository {
    async fn insert(&self, document: Document, initial: DocumentVersion) -> Result<(), VersioningError> {
        let mut state = self.state.lock().unwrap();
        if state
            .documents
            .values()
            .any(|d| d.project_id == document.project_id && d.stage == document.stage)
        {
            return Err(VersioningError::DuplicateStage(document.stage));
        }
        state.documents.insert(document.id, document);
        state.versions.push(initial);
        Ok(())
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, InfrastructureError> {
        Ok(self.state.lock().unwrap().documents.get(&id).cloned())
    }

    async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>, InfrastructureError> {
        let state = self.state.lock().unwrap();
        Ok(state.documents.values().filter(|d| query.matches(d)).cloned().collect())
    }

    async fn versions(&self, id: DocumentId) -> Result<Vec<DocumentVersion>, InfrastructureError> {
        let state = self.state.lock().unwrap();
        let mut versions: Vec<_> = state.versions.iter().filter(|v| v.document_id == id).cloned().collect();
        versions.reverse();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    async fn find_version(&self, id: DocumentId, version: u32) -> Result<Option<DocumentVersion>, InfrastructureError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .versions
            .iter()
            .rev()
            .find(|v| v.document_id == id && v.version == version)
            .cloned())
    }

    async fn commit_edit(&self, id: DocumentId, edit: &EditFn) -> Result<Document, VersioningError> {
        let mut state = self.state.lock().unwrap();
        let mut document = state.documents.get(&id).cloned().ok_or(VersioningError::NotFound)?;
        if let Some(snapshot) = edit(&mut document)? {
            state.versions.push(snapshot);
        }
        state.documents.insert(id, document.clone());
        Ok(document)
    }

    async fn delete(&self, id: DocumentId) -> Result<bool, InfrastructureError> {
        let mut state = self.state.lock().unwrap();
        state.versions.retain(|v| v.document_id != id);
        Ok(state.documents.remove(&id).is_some())
    }
}
