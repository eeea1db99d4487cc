//! `folio-auth`: authentication and authorization boundary.
//!
//! This crate is decoupled from HTTP and storage: every store it needs is an
//! async trait injected by the caller.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod gate;
pub mod issuer;
pub mod membership;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod project;
pub mod revocation;
pub mod roles;
pub mod session;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use authorize::{AccessControlResolver, AccessError, AccessGrant, ActorRole, Target, decide};
pub use claims::{TokenClaims, TokenType};
pub use error::{AuthenticationError, AuthorizationError, TokenError};
pub use gate::{AuthGate, AuthenticationStrategy, GateError, GateState};
pub use issuer::{IssuedToken, TokenIssuer, TokenPair, TokenTtls};
pub use membership::{Invitation, MembershipError, MembershipService, NewProject};
pub use password::{PasswordError, hash_password, verify_password};
pub use permissions::{Action, PermissionSet};
pub use principal::{AuthenticatedUser, Identity};
pub use project::{
    Collaborator, CollaboratorStatus, CollaboratorStoreError, DocumentLocator, Project,
    ProjectStatus, ProjectStore,
};
pub use revocation::{
    ClaimOutcome, RevocationLedger, RevocationPurpose, RevocationStatus, RevocationStore, RevokeOutcome,
};
pub use roles::CollaboratorRole;
pub use session::{RegisterInput, SessionError, SessionService};
pub use user::{User, UserDirectory, UserStoreError};
