//! Infrastructure layer: configuration, Postgres, Redis and in-memory stores.

pub mod config;
pub mod memory;
pub mod postgres;
pub mod revocation;

pub use config::{AppEnv, Config, ConfigError, parse_ttl};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use revocation::InMemoryRevocationStore;

#[cfg(feature = "redis")]
pub use revocation::RedisRevocationStore;
