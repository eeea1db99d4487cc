//! Access control over projects and their documents.
//!
//! Resolution order:
//! 1. the project owner is allowed everything;
//! 2. otherwise an `active` collaborator row must exist (else `NoAccess`);
//! 3. the flag matching the requested action decides.
//!
//! [`decide`] is the pure decision step; [`AccessControlResolver`] loads the
//! records it needs.

use std::sync::Arc;

use thiserror::Error;

use folio_core::{DocumentId, InfrastructureError, ProjectId, UserId};

use crate::error::AuthorizationError;
use crate::permissions::{Action, PermissionSet};
use crate::project::{Collaborator, DocumentLocator, Project, ProjectStore};
use crate::roles::CollaboratorRole;

/// What the actor is acting on. Documents resolve to their project first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Project(ProjectId),
    Document(DocumentId),
}

/// How the actor relates to the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Owner,
    Collaborator(CollaboratorRole),
}

/// A successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub project: Project,
    pub role: ActorRole,
    /// Effective permissions (all of them for the owner).
    pub permissions: PermissionSet,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("resource not found")]
    NotFound,

    #[error(transparent)]
    Denied(#[from] AuthorizationError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

/// Pure authorization decision.
///
/// `collaborator` is the actor's row on the project, if any; rows that are not
/// `active` are ignored.
pub fn decide(
    actor: UserId,
    owner: UserId,
    collaborator: Option<&Collaborator>,
    action: Action,
) -> Result<(ActorRole, PermissionSet), AuthorizationError> {
    if actor == owner {
        return Ok((ActorRole::Owner, PermissionSet::all()));
    }

    let Some(collaborator) = collaborator.filter(|c| c.is_active() && c.user_id == actor) else {
        return Err(AuthorizationError::NoAccess);
    };

    if collaborator.permissions.allows(action) {
        Ok((ActorRole::Collaborator(collaborator.role), collaborator.permissions))
    } else {
        Err(AuthorizationError::InsufficientPermission(action))
    }
}

#[derive(Clone)]
pub struct AccessControlResolver {
    projects: Arc<dyn ProjectStore>,
    documents: Arc<dyn DocumentLocator>,
}

impl AccessControlResolver {
    pub fn new(projects: Arc<dyn ProjectStore>, documents: Arc<dyn DocumentLocator>) -> Self {
        Self { projects, documents }
    }

    pub async fn authorize(&self, actor: UserId, target: Target, action: Action) -> Result<AccessGrant, AccessError> {
        let project_id = match target {
            Target::Project(id) => id,
            Target::Document(id) => self.documents.project_of(id).await?.ok_or(AccessError::NotFound)?,
        };

        let project = self.projects.get_project(project_id).await?.ok_or(AccessError::NotFound)?;

        let collaborator = if actor == project.owner_id {
            None
        } else {
            self.projects.active_collaborator(project_id, actor).await?
        };

        let (role, permissions) = decide(actor, project.owner_id, collaborator.as_ref(), action)?;
        Ok(AccessGrant {
            project,
            role,
            permissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::CollaboratorStatus;
    use crate::testing::{FakeProjects, collaborator, project};
    use proptest::prelude::*;

    #[tokio::test]
    async fn owner_is_allowed_everything() {
        let owner = UserId::new();
        let store = Arc::new(FakeProjects::default());
        let p = project(owner);
        store.put_project(p.clone());
        let resolver = AccessControlResolver::new(store.clone(), store.clone());

        for action in Action::ALL {
            let grant = resolver.authorize(owner, Target::Project(p.id), action).await.unwrap();
            assert_eq!(grant.role, ActorRole::Owner);
        }
    }

    #[tokio::test]
    async fn stranger_gets_no_access() {
        let store = Arc::new(FakeProjects::default());
        let p = project(UserId::new());
        store.put_project(p.clone());
        let resolver = AccessControlResolver::new(store.clone(), store.clone());

        let err = resolver.authorize(UserId::new(), Target::Project(p.id), Action::Read).await.unwrap_err();
        assert_eq!(err, AccessError::Denied(AuthorizationError::NoAccess));
    }

    #[tokio::test]
    async fn document_target_resolves_through_its_project() {
        let store = Arc::new(FakeProjects::default());
        let p = project(UserId::new());
        store.put_project(p.clone());
        let viewer = UserId::new();
        store.put_collaborator(collaborator(&p, viewer, PermissionSet::none(), CollaboratorStatus::Active));
        let doc = DocumentId::new();
        store.put_document(doc, p.id);
        let resolver = AccessControlResolver::new(store.clone(), store.clone());

        assert!(resolver.authorize(viewer, Target::Document(doc), Action::Read).await.is_ok());
        assert_eq!(
            resolver.authorize(viewer, Target::Document(doc), Action::Edit).await.unwrap_err(),
            AccessError::Denied(AuthorizationError::InsufficientPermission(Action::Edit))
        );
    }

    #[tokio::test]
    async fn missing_targets_are_not_found_before_membership() {
        let store = Arc::new(FakeProjects::default());
        let resolver = AccessControlResolver::new(store.clone(), store.clone());

        assert_eq!(
            resolver.authorize(UserId::new(), Target::Project(ProjectId::new()), Action::Read).await.unwrap_err(),
            AccessError::NotFound
        );
        assert_eq!(
            resolver.authorize(UserId::new(), Target::Document(DocumentId::new()), Action::Read).await.unwrap_err(),
            AccessError::NotFound
        );
    }

    #[tokio::test]
    async fn pending_invite_grants_nothing() {
        let store = Arc::new(FakeProjects::default());
        let p = project(UserId::new());
        store.put_project(p.clone());
        let invitee = UserId::new();
        store.put_collaborator(collaborator(&p, invitee, PermissionSet::all(), CollaboratorStatus::Pending));
        let resolver = AccessControlResolver::new(store.clone(), store.clone());

        assert_eq!(
            resolver.authorize(invitee, Target::Project(p.id), Action::Read).await.unwrap_err(),
            AccessError::Denied(AuthorizationError::NoAccess)
        );
    }

    fn permission_set() -> impl Strategy<Value = PermissionSet> {
        any::<[bool; 6]>().prop_map(|f| PermissionSet {
            edit_documents: f[0],
            create_documents: f[1],
            delete_documents: f[2],
            invite_collaborators: f[3],
            manage_project: f[4],
            view_analytics: f[5],
        })
    }

    fn status() -> impl Strategy<Value = CollaboratorStatus> {
        prop::sample::select(vec![
            CollaboratorStatus::Pending,
            CollaboratorStatus::Active,
            CollaboratorStatus::Revoked,
        ])
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Non-owners are allowed exactly when an active row carries the action's flag.
        #[test]
        fn collaborator_decision_follows_flags(
            perms in permission_set(),
            status in status(),
            action in prop::sample::select(Action::ALL.to_vec()),
        ) {
            let owner = UserId::new();
            let actor = UserId::new();
            let p = project(owner);
            let row = collaborator(&p, actor, perms, status);

            let result = decide(actor, owner, Some(&row), action);
            match status {
                CollaboratorStatus::Active if perms.allows(action) => prop_assert!(result.is_ok()),
                CollaboratorStatus::Active => prop_assert_eq!(
                    result,
                    Err(AuthorizationError::InsufficientPermission(action))
                ),
                _ => prop_assert_eq!(result, Err(AuthorizationError::NoAccess)),
            }

            let (role, _) = decide(owner, owner, Some(&row), action).unwrap();
            prop_assert_eq!(role, ActorRole::Owner);
        }
    }
}
