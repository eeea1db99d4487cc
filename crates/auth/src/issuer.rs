//! Token minting and verification (HS256).

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use folio_core::UserId;

use crate::claims::{TokenClaims, TokenType, validate_claims};
use crate::error::TokenError;

/// Token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtls {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            access: Duration::days(7),
            refresh: Duration::days(30),
        }
    }
}

/// A freshly minted token together with its decoded claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// Access + refresh token pair returned by login, registration and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Mints and verifies signed tokens.
///
/// The signing secret is injected at construction; nothing here reads the
/// environment.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttls: TokenTtls,
}

impl core::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenIssuer").field("ttls", &self.ttls).finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ExpiryOnly {
    exp: i64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttls: TokenTtls) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttls,
        }
    }

    pub fn ttls(&self) -> TokenTtls {
        self.ttls
    }

    pub fn issue(&self, user_id: UserId, token_type: TokenType) -> Result<IssuedToken, TokenError> {
        let ttl = match token_type {
            TokenType::Access => self.ttls.access,
            TokenType::Refresh => self.ttls.refresh,
        };
        let claims = TokenClaims::new(user_id, token_type, Utc::now(), ttl);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(IssuedToken { token, claims })
    }

    pub fn issue_access(&self, user_id: UserId) -> Result<IssuedToken, TokenError> {
        self.issue(user_id, TokenType::Access)
    }

    pub fn issue_refresh(&self, user_id: UserId) -> Result<IssuedToken, TokenError> {
        self.issue(user_id, TokenType::Refresh)
    }

    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, TokenError> {
        let access = self.issue_access(user_id)?;
        let refresh = self.issue_refresh(user_id)?;
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "Bearer",
            expires_in: self.ttls.access.num_seconds(),
        })
    }

    /// Verify signature and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        })?;

        validate_claims(&data.claims, Utc::now())?;
        Ok(data.claims)
    }

    /// Verify and additionally require a specific token type.
    pub fn verify_as(&self, token: &str, expected: TokenType) -> Result<TokenClaims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongTokenType {
                expected,
                found: claims.token_type,
            });
        }
        Ok(claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_as(token, TokenType::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_as(token, TokenType::Refresh)
    }

    /// Read the `exp` claim without checking the signature.
    ///
    /// Only used to size revocation TTLs; never to establish trust.
    pub fn peek_expiry(token: &str) -> Option<i64> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<ExpiryOnly>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|data| data.claims.exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"test-secret", TokenTtls::default())
    }

    #[test]
    fn access_token_round_trips_subject_and_type() {
        let issuer = issuer();
        let user = UserId::new();
        let issued = issuer.issue_access(user).unwrap();

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, Duration::days(7).num_seconds());
    }

    #[test]
    fn refresh_ttl_defaults_to_thirty_days() {
        let issued = issuer().issue_refresh(UserId::new()).unwrap();
        assert_eq!(issued.claims.exp - issued.claims.iat, Duration::days(30).num_seconds());
    }

    #[test]
    fn types_are_not_interchangeable() {
        let issuer = issuer();
        let user = UserId::new();
        let pair = issuer.issue_pair(user).unwrap();

        assert_eq!(
            issuer.verify_refresh(&pair.access_token).unwrap_err(),
            TokenError::WrongTokenType {
                expected: TokenType::Refresh,
                found: TokenType::Access,
            }
        );
        assert_eq!(
            issuer.verify_access(&pair.refresh_token).unwrap_err(),
            TokenError::WrongTokenType {
                expected: TokenType::Access,
                found: TokenType::Refresh,
            }
        );
        assert!(issuer.verify_access(&pair.access_token).is_ok());
        assert!(issuer.verify_refresh(&pair.refresh_token).is_ok());
    }

    #[test]
    fn tokens_minted_back_to_back_differ() {
        let issuer = issuer();
        let user = UserId::new();
        let a = issuer.issue_refresh(user).unwrap();
        let b = issuer.issue_refresh(user).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let issuer = TokenIssuer::new(
            b"test-secret",
            TokenTtls {
                access: Duration::seconds(-30),
                refresh: Duration::days(30),
            },
        );
        let issued = issuer.issue_access(UserId::new()).unwrap();
        assert_eq!(issuer.verify(&issued.token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = TokenIssuer::new(b"another-secret", TokenTtls::default());
        let issued = other.issue_access(UserId::new()).unwrap();
        assert_eq!(issuer().verify(&issued.token).unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(issuer().verify("not.a.jwt").unwrap_err(), TokenError::Malformed);
        assert_eq!(issuer().verify("").unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn peek_expiry_ignores_signature() {
        let other = TokenIssuer::new(b"another-secret", TokenTtls::default());
        let issued = other.issue_access(UserId::new()).unwrap();
        assert_eq!(TokenIssuer::peek_expiry(&issued.token), Some(issued.claims.exp));
        assert_eq!(TokenIssuer::peek_expiry("garbage"), None);
    }
}
