//! API-side authorization guard.
//!
//! Handlers call [`require`] before touching a project or document so every
//! denial is logged in one place.

use tracing::warn;

use folio_auth::{AccessControlResolver, AccessError, AccessGrant, Action, Target};

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

pub async fn require(
    resolver: &AccessControlResolver,
    principal: &PrincipalContext,
    target: Target,
    action: Action,
) -> Result<AccessGrant, ApiError> {
    match resolver.authorize(principal.user_id(), target, action).await {
        Ok(grant) => Ok(grant),
        Err(AccessError::Denied(reason)) => {
            warn!(
                user_id = %principal.user_id(),
                target = ?target,
                action = action.as_str(),
                reason = reason.kind(),
                "authorization denied"
            );
            Err(ApiError::Access(AccessError::Denied(reason)))
        }
        Err(err) => Err(ApiError::Access(err)),
    }
}
