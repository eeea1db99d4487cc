//! In-crate fakes for the store traits.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use folio_core::{CollaboratorId, DocumentId, InfrastructureError, ProjectId, UserId};

use crate::permissions::PermissionSet;
use crate::project::{
    Collaborator, CollaboratorStatus, CollaboratorStoreError, DocumentLocator, Project, ProjectStatus, ProjectStore,
};
use crate::revocation::RevocationStore;
use crate::roles::CollaboratorRole;
use crate::user::{User, UserDirectory, UserStoreError};

pub fn project(owner: UserId) -> Project {
    Project {
        id: ProjectId::new(),
        owner_id: owner,
        name: "P1".into(),
        description: None,
        status: ProjectStatus::Active,
        created_at: Utc::now(),
    }
}

pub fn collaborator(project: &Project, user: UserId, permissions: PermissionSet, status: CollaboratorStatus) -> Collaborator {
    Collaborator {
        id: CollaboratorId::new(),
        project_id: project.id,
        user_id: user,
        role: CollaboratorRole::Viewer,
        permissions,
        status,
        invited_by: project.owner_id,
        invited_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct FakeUsers {
    users: Mutex<HashMap<UserId, User>>,
    failing: AtomicBool,
}

impl FakeUsers {
    pub fn put(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), InfrastructureError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(InfrastructureError::store("users offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserDirectory for FakeUsers {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, InfrastructureError> {
        self.check()?;
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, InfrastructureError> {
        self.check()?;
        Ok(self.users.lock().unwrap().values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: User) -> Result<(), UserStoreError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(UserStoreError::EmailTaken);
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<bool, InfrastructureError> {
        self.check()?;
        Ok(match self.users.lock().unwrap().get_mut(&id) {
            Some(user) => {
                user.active = active;
                true
            }
            None => false,
        })
    }

    async fn set_password_hash(&self, id: UserId, password_hash: String) -> Result<bool, InfrastructureError> {
        self.check()?;
        Ok(match self.users.lock().unwrap().get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash;
                true
            }
            None => false,
        })
    }
}

#[derive(Default)]
pub struct FakeProjects {
    projects: Mutex<HashMap<ProjectId, Project>>,
    collaborators: Mutex<HashMap<CollaboratorId, Collaborator>>,
    documents: Mutex<HashMap<DocumentId, ProjectId>>,
}

impl FakeProjects {
    pub fn put_project(&self, project: Project) {
        self.projects.lock().unwrap().insert(project.id, project);
    }

    pub fn put_collaborator(&self, collaborator: Collaborator) {
        self.collaborators.lock().unwrap().insert(collaborator.id, collaborator);
    }

    pub fn put_document(&self, document: DocumentId, project: ProjectId) {
        self.documents.lock().unwrap().insert(document, project);
    }

    fn find(&self, project_id: ProjectId, user_id: UserId, pred: impl Fn(&Collaborator) -> bool) -> Option<Collaborator> {
        self.collaborators
            .lock()
            .unwrap()
            .values()
            .find(|c| c.project_id == project_id && c.user_id == user_id && pred(c))
            .cloned()
    }
}

#[async_trait]
impl ProjectStore for FakeProjects {
    async fn insert_project(&self, project: Project) -> Result<(), InfrastructureError> {
        self.put_project(project);
        Ok(())
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, InfrastructureError> {
        Ok(self.projects.lock().unwrap().get(&id).cloned())
    }

    async fn list_projects_for(&self, user_id: UserId) -> Result<Vec<Project>, InfrastructureError> {
        let collaborators = self.collaborators.lock().unwrap();
        Ok(self
            .projects
            .lock()
            .unwrap()
            .values()
            .filter(|p| {
                p.owner_id == user_id
                    || collaborators
                        .values()
                        .any(|c| c.project_id == p.id && c.user_id == user_id && c.is_active())
            })
            .cloned()
            .collect())
    }

    async fn active_collaborator(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<Collaborator>, InfrastructureError> {
        Ok(self.find(project_id, user_id, |c| c.is_active()))
    }

    async fn open_collaborator(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<Collaborator>, InfrastructureError> {
        Ok(self.find(project_id, user_id, |c| c.status != CollaboratorStatus::Revoked))
    }

    async fn get_collaborator(&self, id: CollaboratorId) -> Result<Option<Collaborator>, InfrastructureError> {
        Ok(self.collaborators.lock().unwrap().get(&id).cloned())
    }

    async fn list_collaborators(&self, project_id: ProjectId) -> Result<Vec<Collaborator>, InfrastructureError> {
        Ok(self
            .collaborators
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.project_id == project_id && c.status != CollaboratorStatus::Revoked)
            .cloned()
            .collect())
    }

    async fn insert_collaborator(&self, collaborator: Collaborator) -> Result<(), CollaboratorStoreError> {
        if self
            .find(collaborator.project_id, collaborator.user_id, |c| c.status != CollaboratorStatus::Revoked)
            .is_some()
        {
            return Err(CollaboratorStoreError::AlreadyMember);
        }
        self.put_collaborator(collaborator);
        Ok(())
    }

    async fn set_collaborator_status(
        &self,
        id: CollaboratorId,
        status: CollaboratorStatus,
    ) -> Result<Option<Collaborator>, InfrastructureError> {
        Ok(self.collaborators.lock().unwrap().get_mut(&id).map(|c| {
            c.status = status;
            c.updated_at = Utc::now();
            c.clone()
        }))
    }
}

#[async_trait]
impl DocumentLocator for FakeProjects {
    async fn project_of(&self, document_id: DocumentId) -> Result<Option<ProjectId>, InfrastructureError> {
        Ok(self.documents.lock().unwrap().get(&document_id).copied())
    }
}

/// Revocation store without expiry, with an outage switch.
#[derive(Default)]
pub struct FakeRevocationStore {
    keys: Mutex<HashMap<String, u64>>,
    failing: AtomicBool,
}

impl FakeRevocationStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.keys.lock().unwrap().len()
    }
}

#[async_trait]
impl RevocationStore for FakeRevocationStore {
    async fn put(&self, key: &str, ttl_secs: u64) -> Result<(), InfrastructureError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(InfrastructureError::cache("connection refused"));
        }
        self.keys.lock().unwrap().insert(key.to_string(), ttl_secs);
        Ok(())
    }

    async fn put_if_absent(&self, key: &str, ttl_secs: u64) -> Result<bool, InfrastructureError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(InfrastructureError::cache("connection refused"));
        }
        let mut keys = self.keys.lock().unwrap();
        if keys.contains_key(key) {
            return Ok(false);
        }
        keys.insert(key.to_string(), ttl_secs);
        Ok(true)
    }

    async fn exists(&self, key: &str) -> Result<bool, InfrastructureError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(InfrastructureError::cache("connection refused"));
        }
        Ok(self.keys.lock().unwrap().contains_key(key))
    }
}
