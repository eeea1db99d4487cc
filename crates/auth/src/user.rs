//! User accounts and the directory that stores them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use folio_core::{InfrastructureError, UserId};

/// A registered account.
///
/// Accounts are deactivated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Always stored lower-cased.
    pub email: String,
    pub display_name: Option<String>,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, display_name: Option<String>, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            email: normalize_email(email),
            display_name,
            password_hash,
            active: true,
            created_at: Utc::now(),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserStoreError {
    #[error("email already registered")]
    EmailTaken,

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

/// Lookup and persistence of user accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, InfrastructureError>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, InfrastructureError>;

    async fn insert(&self, user: User) -> Result<(), UserStoreError>;

    /// Returns `false` when no such user exists.
    async fn set_active(&self, id: UserId, active: bool) -> Result<bool, InfrastructureError>;

    /// Replace the stored Argon2 hash. Returns `false` when no such user exists.
    async fn set_password_hash(&self, id: UserId, password_hash: String) -> Result<bool, InfrastructureError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_users_are_active_with_normalized_email() {
        let user = User::new("  Alice@X.com ", None, "hash".into());
        assert_eq!(user.email, "alice@x.com");
        assert!(user.active);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User::new("a@b.c", Some("A".into()), "secret-hash".into());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
