//! Store selection and service wiring.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use folio_auth::user::normalize_email;
use folio_auth::{
    AccessControlResolver, AuthGate, AuthenticatedUser, AuthenticationStrategy, DocumentLocator, MembershipService,
    ProjectStore, RevocationLedger, RevocationStore, SessionService, TokenIssuer, User, UserDirectory, UserStoreError,
    hash_password,
};
use folio_core::InfrastructureError;
use folio_documents::{DocumentRepository, DocumentVersionManager};
use folio_infra::{Config, InMemoryRevocationStore, InMemoryStore, PostgresStore, RedisRevocationStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error("failed to provision dev user: {0}")]
    Provision(String),
}

/// Store handles shared by every service.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserDirectory>,
    pub projects: Arc<dyn ProjectStore>,
    pub locator: Arc<dyn DocumentLocator>,
    pub documents: Arc<dyn DocumentRepository>,
    pub revocations: Arc<dyn RevocationStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            projects: store.clone(),
            locator: store.clone(),
            documents: store,
            revocations: Arc::new(InMemoryRevocationStore::new()),
        }
    }

    /// Postgres when `DATABASE_URL` is set, Redis when `REDIS_URL` is set;
    /// in-memory otherwise.
    pub async fn from_config(config: &Config) -> Result<Self, InfrastructureError> {
        let mut stores = match &config.database_url {
            Some(url) => {
                let pg = Arc::new(PostgresStore::connect(url).await?);
                pg.migrate().await?;
                info!("using postgres store");
                Self {
                    users: pg.clone(),
                    projects: pg.clone(),
                    locator: pg.clone(),
                    documents: pg,
                    revocations: Arc::new(InMemoryRevocationStore::new()),
                }
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory store");
                Self::in_memory()
            }
        };

        match &config.redis_url {
            Some(url) => {
                stores.revocations = Arc::new(RedisRevocationStore::new(url)?);
                info!("using redis revocation store");
            }
            None => warn!("REDIS_URL not set; revocations are process-local"),
        }

        Ok(stores)
    }
}

#[derive(Clone)]
pub struct AppServices {
    pub gate: AuthGate,
    pub sessions: SessionService,
    pub membership: MembershipService,
    pub access: AccessControlResolver,
    pub documents: DocumentVersionManager,
}

impl AppServices {
    pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
        let stores = Stores::from_config(config).await?;
        Self::build(config, stores).await
    }

    pub async fn build(config: &Config, stores: Stores) -> Result<Self, StartupError> {
        let issuer = TokenIssuer::new(config.jwt_secret.as_bytes(), config.ttls);
        let ledger = RevocationLedger::new(stores.revocations.clone());
        let access = AccessControlResolver::new(stores.projects.clone(), stores.locator.clone());

        let strategy = match &config.dev_bypass_email {
            Some(email) => AuthenticationStrategy::DevBypass(provision_dev_user(stores.users.as_ref(), email).await?),
            None => AuthenticationStrategy::Token {
                issuer: issuer.clone(),
                ledger: ledger.clone(),
                users: stores.users.clone(),
            },
        };

        Ok(Self {
            gate: AuthGate::new(strategy),
            sessions: SessionService::new(issuer, ledger, stores.users.clone()),
            membership: MembershipService::new(stores.projects.clone(), stores.users.clone(), access.clone()),
            access,
            documents: DocumentVersionManager::new(stores.documents.clone()),
        })
    }
}

/// Find or create the fixed dev-bypass identity.
///
/// The account gets a random password, so it cannot be logged into.
async fn provision_dev_user(users: &dyn UserDirectory, email: &str) -> Result<AuthenticatedUser, StartupError> {
    let email = normalize_email(email);
    if let Some(existing) = users.find_by_email(&email).await? {
        return Ok(AuthenticatedUser::from(&existing));
    }

    let hash = hash_password(&Uuid::new_v4().to_string()).map_err(|e| StartupError::Provision(e.to_string()))?;
    let user = User::new(&email, Some("Dev User".to_string()), hash);
    match users.insert(user.clone()).await {
        Ok(()) => {
            info!(user_id = %user.id, email = %user.email, "provisioned dev user");
            Ok(AuthenticatedUser::from(&user))
        }
        // Lost a race with another instance.
        Err(UserStoreError::EmailTaken) => users
            .find_by_email(&email)
            .await?
            .map(|u| AuthenticatedUser::from(&u))
            .ok_or_else(|| StartupError::Provision("dev user vanished after insert conflict".into())),
        Err(UserStoreError::Infrastructure(e)) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let pairs: Vec<(String, String)> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())).unwrap()
    }

    #[tokio::test]
    async fn dev_bypass_provisions_once() {
        let cfg = config(&[("DEV_BYPASS_AUTH", "1"), ("DEV_USER_EMAIL", "Dev@Example.com")]);
        let stores = Stores::in_memory();

        let first = AppServices::build(&cfg, stores.clone()).await.unwrap();
        let second = AppServices::build(&cfg, stores.clone()).await.unwrap();
        assert!(first.gate.is_dev_bypass());

        let a = first.gate.authenticate(None).await.unwrap();
        let b = second.gate.authenticate(None).await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.email, "dev@example.com");
    }

    #[tokio::test]
    async fn token_strategy_without_bypass() {
        let services = AppServices::build(&config(&[]), Stores::in_memory()).await.unwrap();
        assert!(!services.gate.is_dev_bypass());
        assert!(services.gate.authenticate(None).await.is_err());
    }
}
