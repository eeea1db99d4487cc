//! Revocation ledger: tokens invalidated before their natural expiry.
//!
//! Each record lives only as long as the token it shadows, so the backing store
//! never grows without bound. The ledger fails open: when the store is down a
//! token is treated as not revoked and the outage is logged.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use folio_core::InfrastructureError;

use crate::issuer::TokenIssuer;

/// TTL used when a token cannot be decoded to read its expiry.
pub const FALLBACK_TTL_SECS: u64 = 3600;

/// Namespace of a revocation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevocationPurpose {
    Access,
    Refresh,
}

impl RevocationPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }

    pub fn key(&self, token: &str) -> String {
        format!("revoked:{}:{}", self.as_str(), token)
    }
}

/// Result of a revocation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationStatus {
    Revoked,
    NotRevoked,
    /// The store could not be reached; the token is treated as not revoked.
    Degraded,
}

impl RevocationStatus {
    pub fn is_revoked(&self) -> bool {
        matches!(self, Self::Revoked)
    }
}

/// Result of recording a revocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    Recorded { ttl_secs: u64 },
    /// The token had already expired; expiry rejects it on its own.
    AlreadyExpired,
    /// The store could not be reached; nothing was recorded.
    Degraded,
}

/// Result of claiming a token for single use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller recorded the revocation and owns the token's last use.
    Claimed { ttl_secs: u64 },
    /// Someone else revoked or claimed it first.
    AlreadyRevoked,
    AlreadyExpired,
    /// The store could not be reached; nothing was recorded.
    Degraded,
}

/// Self-expiring key store backing the ledger.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn put(&self, key: &str, ttl_secs: u64) -> Result<(), InfrastructureError>;

    /// Record `key` only if it is not already live. Returns `true` when this
    /// call created the record. Must be atomic with respect to concurrent callers.
    async fn put_if_absent(&self, key: &str, ttl_secs: u64) -> Result<bool, InfrastructureError>;

    async fn exists(&self, key: &str) -> Result<bool, InfrastructureError>;
}

#[derive(Clone)]
pub struct RevocationLedger {
    store: Arc<dyn RevocationStore>,
}

impl RevocationLedger {
    pub fn new(store: Arc<dyn RevocationStore>) -> Self {
        Self { store }
    }

    pub async fn revoke(&self, purpose: RevocationPurpose, token: &str) -> RevokeOutcome {
        let Some(ttl_secs) = record_ttl(token) else {
            return RevokeOutcome::AlreadyExpired;
        };

        match self.store.put(&purpose.key(token), ttl_secs).await {
            Ok(()) => {
                debug!(purpose = purpose.as_str(), ttl_secs, "token revoked");
                RevokeOutcome::Recorded { ttl_secs }
            }
            Err(err) => {
                warn!(purpose = purpose.as_str(), error = %err, "revocation not recorded; store unavailable");
                RevokeOutcome::Degraded
            }
        }
    }

    /// Revoke `token` atomically, reporting whether this caller was first.
    ///
    /// Two concurrent claims of the same token never both see `Claimed`.
    pub async fn claim(&self, purpose: RevocationPurpose, token: &str) -> ClaimOutcome {
        let Some(ttl_secs) = record_ttl(token) else {
            return ClaimOutcome::AlreadyExpired;
        };

        match self.store.put_if_absent(&purpose.key(token), ttl_secs).await {
            Ok(true) => {
                debug!(purpose = purpose.as_str(), ttl_secs, "token claimed");
                ClaimOutcome::Claimed { ttl_secs }
            }
            Ok(false) => ClaimOutcome::AlreadyRevoked,
            Err(err) => {
                warn!(purpose = purpose.as_str(), error = %err, "token claim not recorded; store unavailable");
                ClaimOutcome::Degraded
            }
        }
    }

    pub async fn check(&self, purpose: RevocationPurpose, token: &str) -> RevocationStatus {
        match self.store.exists(&purpose.key(token)).await {
            Ok(true) => RevocationStatus::Revoked,
            Ok(false) => RevocationStatus::NotRevoked,
            Err(err) => {
                warn!(purpose = purpose.as_str(), error = %err, "revocation check degraded; treating token as not revoked");
                RevocationStatus::Degraded
            }
        }
    }

    pub async fn is_revoked(&self, purpose: RevocationPurpose, token: &str) -> bool {
        self.check(purpose, token).await.is_revoked()
    }
}

/// Seconds a record for `token` must live, or `None` once it has expired.
fn record_ttl(token: &str) -> Option<u64> {
    match TokenIssuer::peek_expiry(token) {
        Some(exp) => {
            let remaining = exp.saturating_sub(Utc::now().timestamp());
            (remaining > 0).then_some(remaining as u64)
        }
        None => Some(FALLBACK_TTL_SECS),
    }
}
