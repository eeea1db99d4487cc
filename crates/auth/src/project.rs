//! Projects, their collaborators, and the store traits that back them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use folio_core::{CollaboratorId, DocumentId, InfrastructureError, ProjectId, UserId};

use crate::permissions::PermissionSet;
use crate::roles::CollaboratorRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// A project. The owner implicitly holds every permission on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorStatus {
    Pending,
    Active,
    Revoked,
}

impl CollaboratorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Revoked => "revoked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "revoked" => Some(Self::Revoked),
            _ => None,
        }
    }
}

/// A user's membership row on a project.
///
/// Only `Active` rows take part in authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: CollaboratorId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub role: CollaboratorRole,
    pub permissions: PermissionSet,
    pub status: CollaboratorStatus,
    pub invited_by: UserId,
    pub invited_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collaborator {
    pub fn is_active(&self) -> bool {
        self.status == CollaboratorStatus::Active
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorStoreError {
    /// A pending or active row already exists for this (project, user).
    #[error("user is already a collaborator on this project")]
    AlreadyMember,

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

/// Project ownership and collaborator records.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert_project(&self, project: Project) -> Result<(), InfrastructureError>;

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, InfrastructureError>;

    /// Projects the user owns or actively collaborates on, oldest first.
    async fn list_projects_for(&self, user_id: UserId) -> Result<Vec<Project>, InfrastructureError>;

    async fn active_collaborator(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<Collaborator>, InfrastructureError>;

    /// The pending or active row for (project, user), if any.
    async fn open_collaborator(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<Collaborator>, InfrastructureError>;

    async fn get_collaborator(&self, id: CollaboratorId) -> Result<Option<Collaborator>, InfrastructureError>;

    /// Non-revoked collaborators of a project.
    async fn list_collaborators(&self, project_id: ProjectId) -> Result<Vec<Collaborator>, InfrastructureError>;

    /// Fails with `AlreadyMember` when a non-revoked row exists for the pair.
    async fn insert_collaborator(&self, collaborator: Collaborator) -> Result<(), CollaboratorStoreError>;

    /// Returns the updated row, or `None` when it does not exist.
    async fn set_collaborator_status(
        &self,
        id: CollaboratorId,
        status: CollaboratorStatus,
    ) -> Result<Option<Collaborator>, InfrastructureError>;
}

/// Resolves a document to its owning project.
///
/// Permissions are never stored per document.
#[async_trait]
pub trait DocumentLocator: Send + Sync {
    async fn project_of(&self, document_id: DocumentId) -> Result<Option<ProjectId>, InfrastructureError>;
}
