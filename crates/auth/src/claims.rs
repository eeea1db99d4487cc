use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use folio_core::UserId;

use crate::error::TokenError;

/// Discriminator carried by every token.
///
/// An access token is never accepted where a refresh token is required and
/// vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl core::fmt::Display for TokenType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed claim set: `{sub, type, iat, exp, jti}`.
///
/// `jti` keeps two tokens minted for the same user within the same second
/// distinct, so revoking one never revokes the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user id).
    pub sub: UserId,

    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Issued-at, seconds since the epoch.
    pub iat: i64,

    /// Expiry, seconds since the epoch.
    pub exp: i64,

    pub jti: Uuid,
}

impl TokenClaims {
    /// A `ttl` that overflows the calendar saturates to the latest expiry.
    pub fn new(sub: UserId, token_type: TokenType, issued_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            sub,
            token_type,
            iat: issued_at.timestamp(),
            exp: issued_at.checked_add_signed(ttl).map_or(i64::MAX, |t| t.timestamp()),
            jti: Uuid::new_v4(),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Seconds of validity left at `now` (zero once expired).
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.exp - now.timestamp()).max(0)
    }
}

/// Check the claim time window after signature verification.
///
/// The signature layer already rejects expired tokens; this catches claim sets
/// that are internally inconsistent or that fail expiry at `now`.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.exp < claims.iat {
        return Err(TokenError::Malformed);
    }
    if now.timestamp() >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}
