use folio_auth::{AuthenticatedUser, Identity};
use folio_core::UserId;

/// Authenticated identity for a request on a protected route.
///
/// Inserted by [`crate::middleware::auth_middleware`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user: AuthenticatedUser,
    /// Verified bearer token the request was authenticated with; `None` under dev-bypass.
    access_token: Option<String>,
}

impl PrincipalContext {
    pub fn new(user: AuthenticatedUser, access_token: Option<String>) -> Self {
        Self { user, access_token }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn user(&self) -> &AuthenticatedUser {
        &self.user
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

/// Identity for routes where authentication is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    identity: Identity,
}

impl SessionContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}
