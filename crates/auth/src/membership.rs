//! Project creation and the collaborator lifecycle.
//!
//! `pending -> active` on acceptance by the invitee; `pending | active -> revoked`
//! on removal by a member holding `manage_project`.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use folio_core::{CollaboratorId, InfrastructureError, ProjectId, UserId};

use crate::authorize::{AccessControlResolver, AccessError, Target};
use crate::error::AuthorizationError;
use crate::permissions::{Action, PermissionSet};
use crate::project::{Collaborator, CollaboratorStatus, CollaboratorStoreError, Project, ProjectStatus, ProjectStore};
use crate::roles::CollaboratorRole;
use crate::user::{UserDirectory, normalize_email};

const MAX_PROJECT_NAME: usize = 200;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MembershipError {
    #[error("{0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("user is already a collaborator on this project")]
    AlreadyMember,

    #[error(transparent)]
    Denied(#[from] AuthorizationError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

impl From<AccessError> for MembershipError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::NotFound => Self::NotFound,
            AccessError::Denied(e) => Self::Denied(e),
            AccessError::Infrastructure(e) => Self::Infrastructure(e),
        }
    }
}

impl From<CollaboratorStoreError> for MembershipError {
    fn from(value: CollaboratorStoreError) -> Self {
        match value {
            CollaboratorStoreError::AlreadyMember => Self::AlreadyMember,
            CollaboratorStoreError::Infrastructure(e) => Self::Infrastructure(e),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Invitation {
    pub email: String,
    #[serde(default)]
    pub role: CollaboratorRole,
    /// Overrides the role's default flags when present.
    #[serde(default)]
    pub permissions: Option<PermissionSet>,
}

#[derive(Clone)]
pub struct MembershipService {
    projects: Arc<dyn ProjectStore>,
    users: Arc<dyn UserDirectory>,
    resolver: AccessControlResolver,
}

impl MembershipService {
    pub fn new(projects: Arc<dyn ProjectStore>, users: Arc<dyn UserDirectory>, resolver: AccessControlResolver) -> Self {
        Self {
            projects,
            users,
            resolver,
        }
    }

    pub async fn create_project(&self, owner: UserId, input: NewProject) -> Result<Project, MembershipError> {
        let name = input.name.trim();
        if name.is_empty() || name.chars().count() > MAX_PROJECT_NAME {
            return Err(MembershipError::Validation(format!(
                "project name must be 1-{MAX_PROJECT_NAME} characters"
            )));
        }

        let project = Project {
            id: ProjectId::new(),
            owner_id: owner,
            name: name.to_string(),
            description: input.description,
            status: ProjectStatus::Active,
            created_at: Utc::now(),
        };
        self.projects.insert_project(project.clone()).await?;

        info!(project_id = %project.id, owner_id = %owner, "project created");
        Ok(project)
    }

    pub async fn list_projects(&self, user: UserId) -> Result<Vec<Project>, MembershipError> {
        Ok(self.projects.list_projects_for(user).await?)
    }

    pub async fn get_project(&self, actor: UserId, id: ProjectId) -> Result<Project, MembershipError> {
        let grant = self.resolver.authorize(actor, Target::Project(id), Action::Read).await?;
        Ok(grant.project)
    }

    pub async fn list_collaborators(&self, actor: UserId, id: ProjectId) -> Result<Vec<Collaborator>, MembershipError> {
        self.resolver.authorize(actor, Target::Project(id), Action::Read).await?;
        Ok(self.projects.list_collaborators(id).await?)
    }

    pub async fn invite(
        &self,
        actor: UserId,
        project_id: ProjectId,
        invitation: Invitation,
    ) -> Result<Collaborator, MembershipError> {
        let grant = self.resolver.authorize(actor, Target::Project(project_id), Action::Invite).await?;

        let Some(invitee) = self.users.find_by_email(&normalize_email(&invitation.email)).await? else {
            return Err(MembershipError::NotFound);
        };
        if invitee.id == grant.project.owner_id {
            return Err(MembershipError::Validation("the project owner cannot be invited".into()));
        }

        let now = Utc::now();
        let collaborator = Collaborator {
            id: CollaboratorId::new(),
            project_id,
            user_id: invitee.id,
            role: invitation.role,
            permissions: invitation
                .permissions
                .unwrap_or_else(|| invitation.role.default_permissions()),
            status: CollaboratorStatus::Pending,
            invited_by: actor,
            invited_at: now,
            updated_at: now,
        };
        self.projects.insert_collaborator(collaborator.clone()).await?;

        info!(project_id = %project_id, collaborator_id = %collaborator.id, "collaborator invited");
        Ok(collaborator)
    }

    /// Accept the caller's own pending invitation.
    pub async fn accept(&self, actor: UserId, project_id: ProjectId) -> Result<Collaborator, MembershipError> {
        let pending = self
            .projects
            .open_collaborator(project_id, actor)
            .await?
            .filter(|c| c.status == CollaboratorStatus::Pending)
            .ok_or(MembershipError::NotFound)?;

        let accepted = self
            .projects
            .set_collaborator_status(pending.id, CollaboratorStatus::Active)
            .await?
            .ok_or(MembershipError::NotFound)?;

        info!(project_id = %project_id, collaborator_id = %accepted.id, "invitation accepted");
        Ok(accepted)
    }

    pub async fn revoke(
        &self,
        actor: UserId,
        project_id: ProjectId,
        collaborator_id: CollaboratorId,
    ) -> Result<Collaborator, MembershipError> {
        self.resolver.authorize(actor, Target::Project(project_id), Action::Manage).await?;

        let existing = self
            .projects
            .get_collaborator(collaborator_id)
            .await?
            .filter(|c| c.project_id == project_id && c.status != CollaboratorStatus::Revoked)
            .ok_or(MembershipError::NotFound)?;

        let revoked = self
            .projects
            .set_collaborator_status(existing.id, CollaboratorStatus::Revoked)
            .await?
            .ok_or(MembershipError::NotFound)?;

        info!(project_id = %project_id, collaborator_id = %revoked.id, "collaborator revoked");
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeProjects, FakeUsers};
    use crate::user::User;

    struct Fixture {
        svc: MembershipService,
        owner: User,
        bob: User,
    }

    fn fixture() -> Fixture {
        let projects = Arc::new(FakeProjects::default());
        let users = Arc::new(FakeUsers::default());
        let owner = User::new("owner@x.com", None, "h".into());
        let bob = User::new("bob@x.com", None, "h".into());
        users.put(owner.clone());
        users.put(bob.clone());
        let resolver = AccessControlResolver::new(projects.clone(), projects.clone());
        Fixture {
            svc: MembershipService::new(projects, users, resolver),
            owner,
            bob,
        }
    }

    fn invite_bob(role: CollaboratorRole) -> Invitation {
        Invitation {
            email: "Bob@x.com".into(),
            role,
            permissions: None,
        }
    }

    #[tokio::test]
    async fn invite_accept_revoke_lifecycle() {
        let f = fixture();
        let p = f
            .svc
            .create_project(f.owner.id, NewProject { name: "P1".into(), description: None })
            .await
            .unwrap();

        let invited = f.svc.invite(f.owner.id, p.id, invite_bob(CollaboratorRole::Editor)).await.unwrap();
        assert_eq!(invited.status, CollaboratorStatus::Pending);
        assert_eq!(
            f.svc.get_project(f.bob.id, p.id).await.unwrap_err(),
            MembershipError::Denied(AuthorizationError::NoAccess)
        );

        let accepted = f.svc.accept(f.bob.id, p.id).await.unwrap();
        assert_eq!(accepted.status, CollaboratorStatus::Active);
        assert_eq!(f.svc.get_project(f.bob.id, p.id).await.unwrap().id, p.id);
        assert_eq!(f.svc.list_projects(f.bob.id).await.unwrap().len(), 1);

        assert_eq!(
            f.svc.revoke(f.bob.id, p.id, accepted.id).await.unwrap_err(),
            MembershipError::Denied(AuthorizationError::InsufficientPermission(Action::Manage))
        );

        let revoked = f.svc.revoke(f.owner.id, p.id, accepted.id).await.unwrap();
        assert_eq!(revoked.status, CollaboratorStatus::Revoked);
        assert!(f.svc.get_project(f.bob.id, p.id).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_invites_are_refused() {
        let f = fixture();
        let p = f
            .svc
            .create_project(f.owner.id, NewProject { name: "P1".into(), description: None })
            .await
            .unwrap();
        f.svc.invite(f.owner.id, p.id, invite_bob(CollaboratorRole::Viewer)).await.unwrap();
        assert_eq!(
            f.svc.invite(f.owner.id, p.id, invite_bob(CollaboratorRole::Viewer)).await.unwrap_err(),
            MembershipError::AlreadyMember
        );
    }

    #[tokio::test]
    async fn accepting_without_invitation_is_not_found() {
        let f = fixture();
        let p = f
            .svc
            .create_project(f.owner.id, NewProject { name: "P1".into(), description: None })
            .await
            .unwrap();
        assert_eq!(f.svc.accept(f.bob.id, p.id).await.unwrap_err(), MembershipError::NotFound);
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let f = fixture();
        let err = f
            .svc
            .create_project(f.owner.id, NewProject { name: "   ".into(), description: None })
            .await
            .unwrap_err();
        assert!(matches!(err, MembershipError::Validation(_)));
    }
}
