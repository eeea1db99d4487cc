//! Revocation store backends.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use folio_auth::RevocationStore;
use folio_core::InfrastructureError;

/// Process-local TTL map. Expired keys are purged lazily on access.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    keys: Mutex<HashMap<String, Instant>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live (unexpired) records.
    pub fn len(&self) -> usize {
        match self.keys.lock() {
            Ok(mut keys) => {
                purge(&mut keys, Instant::now());
                keys.len()
            }
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn purge(keys: &mut HashMap<String, Instant>, now: Instant) {
    keys.retain(|_, expires_at| *expires_at > now);
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn put(&self, key: &str, ttl_secs: u64) -> Result<(), InfrastructureError> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| InfrastructureError::cache("revocation map lock poisoned"))?;
        let now = Instant::now();
        purge(&mut keys, now);
        keys.insert(key.to_string(), now + Duration::from_secs(ttl_secs));
        Ok(())
    }

    async fn put_if_absent(&self, key: &str, ttl_secs: u64) -> Result<bool, InfrastructureError> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| InfrastructureError::cache("revocation map lock poisoned"))?;
        let now = Instant::now();
        purge(&mut keys, now);
        match keys.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(now + Duration::from_secs(ttl_secs));
                Ok(true)
            }
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, InfrastructureError> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| InfrastructureError::cache("revocation map lock poisoned"))?;
        let now = Instant::now();
        match keys.get(key) {
            Some(expires_at) if *expires_at > now => Ok(true),
            Some(_) => {
                keys.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}

#[cfg(feature = "redis")]
pub use redis_store::RedisRevocationStore;

#[cfg(feature = "redis")]
mod redis_store {
    use std::sync::Arc;

    use async_trait::async_trait;
    use redis::aio::MultiplexedConnection;
    use tokio::sync::Mutex;
    use tracing::{instrument, warn};

    use folio_auth::RevocationStore;
    use folio_core::InfrastructureError;

    /// Redis-backed ledger store: `SET key 1 EX ttl [NX]` / `EXISTS key`.
    ///
    /// The connection is opened lazily and dropped after any command error so
    /// the next call reconnects.
    #[derive(Clone)]
    pub struct RedisRevocationStore {
        client: Arc<redis::Client>,
        conn: Arc<Mutex<Option<MultiplexedConnection>>>,
    }

    impl RedisRevocationStore {
        pub fn new(redis_url: impl AsRef<str>) -> Result<Self, InfrastructureError> {
            let client = redis::Client::open(redis_url.as_ref()).map_err(|e| InfrastructureError::cache(e.to_string()))?;
            Ok(Self {
                client: Arc::new(client),
                conn: Arc::new(Mutex::new(None)),
            })
        }

        async fn connection(&self) -> Result<MultiplexedConnection, InfrastructureError> {
            let mut slot = self.conn.lock().await;
            if let Some(conn) = slot.as_ref() {
                return Ok(conn.clone());
            }
            let conn = self
                .client
                .get_multiplexed_tokio_connection()
                .await
                .map_err(|e| InfrastructureError::cache(e.to_string()))?;
            *slot = Some(conn.clone());
            Ok(conn)
        }

        async fn reset(&self, err: &redis::RedisError) -> InfrastructureError {
            warn!(error = %err, "redis command failed; dropping connection");
            *self.conn.lock().await = None;
            InfrastructureError::cache(err.to_string())
        }
    }

    #[async_trait]
    impl RevocationStore for RedisRevocationStore {
        #[instrument(skip(self, key), err)]
        async fn put(&self, key: &str, ttl_secs: u64) -> Result<(), InfrastructureError> {
            let mut conn = self.connection().await?;
            let result: Result<(), redis::RedisError> = redis::cmd("SET")
                .arg(key)
                .arg("1")
                .arg("EX")
                .arg(ttl_secs.max(1))
                .query_async(&mut conn)
                .await;
            match result {
                Ok(()) => Ok(()),
                Err(e) => Err(self.reset(&e).await),
            }
        }

        #[instrument(skip(self, key), err)]
        async fn put_if_absent(&self, key: &str, ttl_secs: u64) -> Result<bool, InfrastructureError> {
            let mut conn = self.connection().await?;
            // Nil reply when the key already exists.
            let result: Result<Option<String>, redis::RedisError> = redis::cmd("SET")
                .arg(key)
                .arg("1")
                .arg("EX")
                .arg(ttl_secs.max(1))
                .arg("NX")
                .query_async(&mut conn)
                .await;
            match result {
                Ok(reply) => Ok(reply.is_some()),
                Err(e) => Err(self.reset(&e).await),
            }
        }

        #[instrument(skip(self, key), err)]
        async fn exists(&self, key: &str) -> Result<bool, InfrastructureError> {
            let mut conn = self.connection().await?;
            let result: Result<bool, redis::RedisError> = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await;
            match result {
                Ok(found) => Ok(found),
                Err(e) => Err(self.reset(&e).await),
            }
        }
    }
}
