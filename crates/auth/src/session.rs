//! Registration, login, refresh rotation, logout and password changes.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use folio_core::{InfrastructureError, UserId};

use crate::error::{AuthenticationError, TokenError};
use crate::issuer::{TokenIssuer, TokenPair};
use crate::password::{self, MIN_PASSWORD_LEN, PasswordError};
use crate::revocation::{ClaimOutcome, RevocationLedger, RevocationPurpose, RevokeOutcome};
use crate::user::{User, UserDirectory, UserStoreError, normalize_email};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("email already registered")]
    EmailTaken,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::AccountDisabled => "account_disabled",
            Self::EmailTaken => "email_taken",
            Self::Validation(_) => "validation_error",
            Self::Authentication(e) => e.kind(),
            Self::Infrastructure(e) => e.kind(),
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials => 401,
            Self::AccountDisabled => 403,
            Self::EmailTaken => 409,
            Self::Validation(_) => 400,
            Self::Authentication(e) => e.status_code(),
            Self::Infrastructure(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<UserStoreError> for SessionError {
    fn from(value: UserStoreError) -> Self {
        match value {
            UserStoreError::EmailTaken => Self::EmailTaken,
            UserStoreError::Infrastructure(e) => Self::Infrastructure(e),
        }
    }
}

impl From<PasswordError> for SessionError {
    fn from(value: PasswordError) -> Self {
        match value {
            PasswordError::TooShort => Self::Validation(value.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

fn signing(err: TokenError) -> SessionError {
    SessionError::Internal(err.to_string())
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl RegisterInput {
    fn validate(&self) -> Result<(), SessionError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(SessionError::Validation("a valid email is required".into()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SessionError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct SessionService {
    issuer: TokenIssuer,
    ledger: RevocationLedger,
    users: Arc<dyn UserDirectory>,
}

impl SessionService {
    pub fn new(issuer: TokenIssuer, ledger: RevocationLedger, users: Arc<dyn UserDirectory>) -> Self {
        Self { issuer, ledger, users }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<(User, TokenPair), SessionError> {
        input.validate()?;
        let hash = password::hash_password(&input.password)?;
        let display_name = input.display_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let user = User::new(&input.email, display_name, hash);

        self.users.insert(user.clone()).await?;
        let pair = self.issuer.issue_pair(user.id).map_err(signing)?;

        info!(user_id = %user.id, "user registered");
        Ok((user, pair))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair), SessionError> {
        let Some(user) = self.users.find_by_email(&normalize_email(email)).await? else {
            return Err(SessionError::InvalidCredentials);
        };
        if !password::verify_password(password, &user.password_hash)? {
            return Err(SessionError::InvalidCredentials);
        }
        if !user.active {
            return Err(SessionError::AccountDisabled);
        }

        let pair = self.issuer.issue_pair(user.id).map_err(signing)?;
        info!(user_id = %user.id, "user logged in");
        Ok((user, pair))
    }

    /// Rotate a refresh token.
    ///
    /// The old token is claimed in the ledger before the new pair is minted, so
    /// a refresh token rotates at most once. With the ledger down rotation still
    /// succeeds and the old token stays usable until it expires.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let claims = self
            .issuer
            .verify_refresh(refresh_token)
            .map_err(AuthenticationError::from)?;

        let Some(user) = self.users.find_by_id(claims.sub).await? else {
            return Err(AuthenticationError::UserNotFound.into());
        };
        if !user.active {
            return Err(AuthenticationError::AccountDisabled.into());
        }

        match self.ledger.claim(RevocationPurpose::Refresh, refresh_token).await {
            ClaimOutcome::Claimed { .. } => {}
            ClaimOutcome::AlreadyRevoked => return Err(AuthenticationError::Revoked.into()),
            ClaimOutcome::AlreadyExpired => return Err(AuthenticationError::Expired.into()),
            ClaimOutcome::Degraded => {
                warn!(user_id = %user.id, "superseded refresh token left unrevoked; ledger unavailable")
            }
        }

        let pair = self.issuer.issue_pair(user.id).map_err(signing)?;
        info!(user_id = %user.id, "refresh token rotated");
        Ok(pair)
    }

    /// Revoke the caller's access token and, when it is theirs, a refresh token.
    ///
    /// A refresh token that fails verification or belongs to another user is
    /// ignored. Never fails.
    pub async fn logout(&self, user_id: UserId, access_token: Option<&str>, refresh_token: Option<&str>) {
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            if self.ledger.revoke(RevocationPurpose::Access, token).await == RevokeOutcome::Degraded {
                warn!(user_id = %user_id, "access token left unrevoked at logout");
            }
        }

        if let Some(token) = refresh_token.filter(|t| !t.is_empty()) {
            match self.issuer.verify_refresh(token) {
                Ok(claims) if claims.sub == user_id => {
                    if self.ledger.revoke(RevocationPurpose::Refresh, token).await == RevokeOutcome::Degraded {
                        warn!(user_id = %user_id, "refresh token left unrevoked at logout");
                    }
                }
                Ok(_) => warn!(user_id = %user_id, "logout ignored a refresh token issued to another user"),
                Err(err) => debug!(user_id = %user_id, error = %err, "logout ignored an invalid refresh token"),
            }
        }

        info!(user_id = %user_id, "user logged out");
    }

    /// Replace the caller's password after checking the current one.
    ///
    /// Issued tokens stay valid.
    pub async fn change_password(&self, user_id: UserId, current: &str, new: &str) -> Result<(), SessionError> {
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(SessionError::Validation(format!(
                "new password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Err(AuthenticationError::UserNotFound.into());
        };
        if !password::verify_password(current, &user.password_hash)? {
            return Err(SessionError::InvalidCredentials);
        }

        let hash = password::hash_password(new)?;
        if !self.users.set_password_hash(user.id, hash).await? {
            return Err(AuthenticationError::UserNotFound.into());
        }

        info!(user_id = %user.id, "password changed");
        Ok(())
    }
}
