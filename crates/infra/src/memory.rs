//! In-memory store for tests and development.
//!
//! One value implements every store trait so a single `Arc` can be handed to
//! each service.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use folio_auth::{
    Collaborator, CollaboratorStatus, CollaboratorStoreError, DocumentLocator, Project, ProjectStore, User,
    UserDirectory, UserStoreError,
};
use folio_core::{CollaboratorId, DocumentId, InfrastructureError, ProjectId, UserId};
use folio_documents::{Document, DocumentQuery, DocumentRepository, DocumentVersion, EditFn, VersioningError};

#[derive(Debug, Default)]
struct DocumentState {
    documents: HashMap<DocumentId, Document>,
    /// Append-only, in commit order.
    versions: Vec<DocumentVersion>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    projects: RwLock<HashMap<ProjectId, Project>>,
    collaborators: RwLock<HashMap<CollaboratorId, Collaborator>>,
    documents: RwLock<DocumentState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, InfrastructureError> {
    lock.read().map_err(|_| InfrastructureError::store("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, InfrastructureError> {
    lock.write().map_err(|_| InfrastructureError::store("in-memory store lock poisoned"))
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, InfrastructureError> {
        Ok(read(&self.users)?.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, InfrastructureError> {
        Ok(read(&self.users)?.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: User) -> Result<(), UserStoreError> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(UserStoreError::EmailTaken);
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<bool, InfrastructureError> {
        let mut users = write(&self.users)?;
        Ok(match users.get_mut(&id) {
            Some(user) => {
                user.active = active;
                true
            }
            None => false,
        })
    }

    async fn set_password_hash(&self, id: UserId, password_hash: String) -> Result<bool, InfrastructureError> {
        let mut users = write(&self.users)?;
        Ok(match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    async fn insert_project(&self, project: Project) -> Result<(), InfrastructureError> {
        write(&self.projects)?.insert(project.id, project);
        Ok(())
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, InfrastructureError> {
        Ok(read(&self.projects)?.get(&id).cloned())
    }

    async fn list_projects_for(&self, user_id: UserId) -> Result<Vec<Project>, InfrastructureError> {
        let member_of: Vec<ProjectId> = read(&self.collaborators)?
            .values()
            .filter(|c| c.user_id == user_id && c.is_active())
            .map(|c| c.project_id)
            .collect();

        let mut projects: Vec<Project> = read(&self.projects)?
            .values()
            .filter(|p| p.owner_id == user_id || member_of.contains(&p.id))
            .cloned()
            .collect();
        projects.sort_by_key(|p| p.created_at);
        Ok(projects)
    }

    async fn active_collaborator(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<Collaborator>, InfrastructureError> {
        Ok(read(&self.collaborators)?
            .values()
            .find(|c| c.project_id == project_id && c.user_id == user_id && c.is_active())
            .cloned())
    }

    async fn open_collaborator(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<Collaborator>, InfrastructureError> {
        Ok(read(&self.collaborators)?
            .values()
            .find(|c| c.project_id == project_id && c.user_id == user_id && c.status != CollaboratorStatus::Revoked)
            .cloned())
    }

    async fn get_collaborator(&self, id: CollaboratorId) -> Result<Option<Collaborator>, InfrastructureError> {
        Ok(read(&self.collaborators)?.get(&id).cloned())
    }

    async fn list_collaborators(&self, project_id: ProjectId) -> Result<Vec<Collaborator>, InfrastructureError> {
        let mut rows: Vec<Collaborator> = read(&self.collaborators)?
            .values()
            .filter(|c| c.project_id == project_id && c.status != CollaboratorStatus::Revoked)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.invited_at);
        Ok(rows)
    }

    async fn insert_collaborator(&self, collaborator: Collaborator) -> Result<(), CollaboratorStoreError> {
        let mut rows = write(&self.collaborators)?;
        let taken = rows.values().any(|c| {
            c.project_id == collaborator.project_id
                && c.user_id == collaborator.user_id
                && c.status != CollaboratorStatus::Revoked
        });
        if taken {
            return Err(CollaboratorStoreError::AlreadyMember);
        }
        rows.insert(collaborator.id, collaborator);
        Ok(())
    }

    async fn set_collaborator_status(
        &self,
        id: CollaboratorId,
        status: CollaboratorStatus,
    ) -> Result<Option<Collaborator>, InfrastructureError> {
        let mut rows = write(&self.collaborators)?;
        Ok(rows.get_mut(&id).map(|c| {
            c.status = status;
            c.updated_at = Utc::now();
            c.clone()
        }))
    }
}

#[async_trait]
impl DocumentLocator for InMemoryStore {
    async fn project_of(&self, document_id: DocumentId) -> Result<Option<ProjectId>, InfrastructureError> {
        Ok(read(&self.documents)?.documents.get(&document_id).map(|d| d.project_id))
    }
}

#[async_trait]
impl DocumentRepository for InMemoryStore {
    async fn insert(&self, document: Document, initial: DocumentVersion) -> Result<(), VersioningError> {
        let mut state = write(&self.documents)?;
        let taken = state
            .documents
            .values()
            .any(|d| d.project_id == document.project_id && d.stage == document.stage);
        if taken {
            return Err(VersioningError::DuplicateStage(document.stage));
        }
        state.documents.insert(document.id, document);
        state.versions.push(initial);
        Ok(())
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, InfrastructureError> {
        Ok(read(&self.documents)?.documents.get(&id).cloned())
    }

    async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>, InfrastructureError> {
        let mut docs: Vec<Document> = read(&self.documents)?
            .documents
            .values()
            .filter(|d| query.matches(d))
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(docs)
    }

    async fn versions(&self, id: DocumentId) -> Result<Vec<DocumentVersion>, InfrastructureError> {
        let state = read(&self.documents)?;
        let mut versions: Vec<DocumentVersion> =
            state.versions.iter().rev().filter(|v| v.document_id == id).cloned().collect();
        // Stable: among equal numbers the most recent commit stays first.
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    async fn find_version(&self, id: DocumentId, version: u32) -> Result<Option<DocumentVersion>, InfrastructureError> {
        Ok(read(&self.documents)?
            .versions
            .iter()
            .rev()
            .find(|v| v.document_id == id && v.version == version)
            .cloned())
    }

    async fn commit_edit(&self, id: DocumentId, edit: &EditFn) -> Result<Document, VersioningError> {
        let mut state = write(&self.documents)?;
        let mut document = state.documents.get(&id).cloned().ok_or(VersioningError::NotFound)?;
        if let Some(snapshot) = edit(&mut document)? {
            state.versions.push(snapshot);
        }
        state.documents.insert(id, document.clone());
        Ok(document)
    }

    async fn delete(&self, id: DocumentId) -> Result<bool, InfrastructureError> {
        let mut state = write(&self.documents)?;
        state.versions.retain(|v| v.document_id != id);
        Ok(state.documents.remove(&id).is_some())
    }
}
