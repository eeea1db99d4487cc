//! Per-request authentication.
//!
//! `Unauthenticated -> PendingVerification -> Authenticated | Rejected`, with
//! the pipeline short-circuiting on the first failure:
//! missing token, revoked, signature/expiry/type, unknown user, disabled user.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use folio_core::InfrastructureError;

use crate::error::AuthenticationError;
use crate::issuer::TokenIssuer;
use crate::principal::{AuthenticatedUser, Identity};
use crate::revocation::{RevocationLedger, RevocationPurpose};
use crate::user::UserDirectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unauthenticated,
    PendingVerification,
    Authenticated,
    Rejected(AuthenticationError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error(transparent)]
    Rejected(#[from] AuthenticationError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

/// How requests are authenticated. Chosen once at startup.
#[derive(Clone)]
pub enum AuthenticationStrategy {
    /// Bearer access tokens, checked against the revocation ledger and the
    /// user directory.
    Token {
        issuer: TokenIssuer,
        ledger: RevocationLedger,
        users: Arc<dyn UserDirectory>,
    },
    /// Every request acts as this provisioned user. Development only.
    DevBypass(AuthenticatedUser),
}

#[derive(Clone)]
pub struct AuthGate {
    strategy: AuthenticationStrategy,
}

impl AuthGate {
    pub fn new(strategy: AuthenticationStrategy) -> Self {
        if let AuthenticationStrategy::DevBypass(user) = &strategy {
            info!(email = %user.email, "authentication bypass enabled");
        }
        Self { strategy }
    }

    pub fn is_dev_bypass(&self) -> bool {
        matches!(self.strategy, AuthenticationStrategy::DevBypass(_))
    }

    /// Run the full pipeline on a raw bearer token.
    pub async fn authenticate(&self, bearer: Option<&str>) -> Result<AuthenticatedUser, GateError> {
        let (issuer, ledger, users) = match &self.strategy {
            AuthenticationStrategy::DevBypass(user) => return Ok(user.clone()),
            AuthenticationStrategy::Token { issuer, ledger, users } => (issuer, ledger, users),
        };

        let mut state = GateState::Unauthenticated;

        let Some(token) = bearer.filter(|t| !t.is_empty()) else {
            return Err(reject(&mut state, AuthenticationError::MissingToken));
        };
        transition(&mut state, GateState::PendingVerification);

        if ledger.is_revoked(RevocationPurpose::Access, token).await {
            return Err(reject(&mut state, AuthenticationError::Revoked));
        }

        let claims = match issuer.verify_access(token) {
            Ok(claims) => claims,
            Err(err) => return Err(reject(&mut state, err.into())),
        };

        let Some(user) = users.find_by_id(claims.sub).await? else {
            return Err(reject(&mut state, AuthenticationError::UserNotFound));
        };
        if !user.active {
            return Err(reject(&mut state, AuthenticationError::AccountDisabled));
        }

        transition(&mut state, GateState::Authenticated);
        Ok(AuthenticatedUser::from(&user))
    }

    /// Same pipeline, but rejections yield an anonymous identity.
    ///
    /// Store failures still surface.
    pub async fn authenticate_optional(&self, bearer: Option<&str>) -> Result<Identity, InfrastructureError> {
        match self.authenticate(bearer).await {
            Ok(user) => Ok(Identity::User(user)),
            Err(GateError::Rejected(_)) => Ok(Identity::Anonymous),
            Err(GateError::Infrastructure(err)) => Err(err),
        }
    }
}

fn transition(state: &mut GateState, next: GateState) {
    debug!(from = ?state, to = ?next, "auth gate transition");
    *state = next;
}

fn reject(state: &mut GateState, err: AuthenticationError) -> GateError {
    transition(state, GateState::Rejected(err));
    GateError::Rejected(err)
}
