//! Authentication, authorization and token errors.
//!
//! Each variant carries a stable machine-readable `kind()` and the HTTP status
//! it maps to, so transports never have to re-derive either.

use thiserror::Error;

use crate::claims::TokenType;
use crate::permissions::Action;

/// Why a request could not be authenticated.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("an access token is required")]
    MissingToken,

    #[error("session expired, please log in again")]
    Expired,

    #[error("session has been revoked, please log in again")]
    Revoked,

    #[error("invalid token, please log in again")]
    Invalid,

    #[error("account not found, please log in again")]
    UserNotFound,

    #[error("account is disabled")]
    AccountDisabled,
}

impl AuthenticationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::Expired => "token_expired",
            Self::Revoked => "token_revoked",
            Self::Invalid => "token_invalid",
            Self::UserNotFound => "user_not_found",
            Self::AccountDisabled => "account_disabled",
        }
    }

    /// HTTP status code. A disabled account is known but forbidden.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AccountDisabled => 403,
            _ => 401,
        }
    }
}

/// Why an authenticated actor may not perform an action.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("you do not have access to this project")]
    NoAccess,

    #[error("missing permission for action '{0}'")]
    InsufficientPermission(Action),
}

impl AuthorizationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoAccess => "no_access",
            Self::InsufficientPermission(_) => "insufficient_permission",
        }
    }

    pub fn status_code(&self) -> u16 {
        403
    }
}

/// Token minting/verification failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is malformed")]
    Malformed,

    #[error("expected a {expected} token, got a {found} token")]
    WrongTokenType { expected: TokenType, found: TokenType },

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for AuthenticationError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Expired => Self::Expired,
            _ => Self::Invalid,
        }
    }
}
