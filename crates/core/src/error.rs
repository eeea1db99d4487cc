//! Error model shared across crates.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic, business-level failures (validation, conflicts, missing
/// records). Infrastructure concerns are reported through
/// [`InfrastructureError`] instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found.
    #[error("not found")]
    NotFound,

    /// A uniqueness or state conflict.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

/// Failure of a shared external resource.
///
/// `CacheUnavailable` is only ever produced by the revocation cache and is
/// recovered locally by the ledger. `StoreUnavailable` is fatal to the request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InfrastructureError {
    #[error("revocation cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl InfrastructureError {
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::CacheUnavailable(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CacheUnavailable(_) => "cache_unavailable",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}
