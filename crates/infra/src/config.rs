//! Process configuration from the environment.

use std::net::SocketAddr;

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::warn;

use folio_auth::TokenTtls;

pub const DEV_JWT_SECRET: &str = "folio-dev-secret-change-me";
pub const DEFAULT_DEV_USER_EMAIL: &str = "dev@folio.local";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Test,
    Production,
}

impl AppEnv {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "test" => Some(Self::Test),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{0} must be set when APP_ENV=production")]
    MissingInProduction(&'static str),

    #[error("DEV_BYPASS_AUTH cannot be enabled when APP_ENV=production")]
    BypassInProduction,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,
    pub jwt_secret: String,
    pub ttls: TokenTtls,
    /// Dev-bypass identity, when the bypass strategy is selected.
    pub dev_bypass_email: Option<String>,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// Loads `.env` first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let app_env = match var("APP_ENV") {
            Some(raw) => AppEnv::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "APP_ENV",
                reason: format!("unknown environment '{raw}'"),
            })?,
            None => AppEnv::Development,
        };
        let production = app_env == AppEnv::Production;

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if production => return Err(ConfigError::MissingInProduction("JWT_SECRET")),
            None => {
                warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let defaults = TokenTtls::default();
        let ttls = TokenTtls {
            access: ttl_var(&var, "ACCESS_TOKEN_TTL", defaults.access)?,
            refresh: ttl_var(&var, "REFRESH_TOKEN_TTL", defaults.refresh)?,
        };

        let bypass = match var("DEV_BYPASS_AUTH") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "DEV_BYPASS_AUTH",
                reason: format!("expected a boolean, got '{raw}'"),
            })?,
            None => false,
        };
        if bypass && production {
            return Err(ConfigError::BypassInProduction);
        }
        let dev_bypass_email =
            bypass.then(|| var("DEV_USER_EMAIL").unwrap_or_else(|| DEFAULT_DEV_USER_EMAIL.to_string()));

        let bind_raw = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: "BIND_ADDR",
            reason: e.to_string(),
        })?;

        Ok(Self {
            app_env,
            jwt_secret,
            ttls,
            dev_bypass_email,
            database_url: var("DATABASE_URL"),
            redis_url: var("REDIS_URL"),
            bind_addr,
        })
    }
}

fn ttl_var(var: &impl Fn(&str) -> Option<String>, key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let Some(raw) = var(key) else {
        return Ok(default);
    };
    let ttl = parse_ttl(&raw).ok_or_else(|| ConfigError::Invalid {
        var: key,
        reason: format!("expected a duration like 30s, 15m, 12h, 7d; got '{raw}'"),
    })?;
    if Utc::now().checked_add_signed(ttl).is_none() {
        return Err(ConfigError::Invalid {
            var: key,
            reason: format!("duration '{raw}' is out of range"),
        });
    }
    Ok(ttl)
}

/// Parse `30s`, `15m`, `12h`, `7d` or bare seconds. Zero and values that
/// overflow a `Duration` are rejected.
pub fn parse_ttl(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last()? {
        (i, c) if c.is_ascii_alphabetic() => (&raw[..i], c.to_ascii_lowercase()),
        _ => (raw, 's'),
    };
    let n: i64 = digits.parse().ok().filter(|n| *n > 0)?;
    match unit {
        's' => Duration::try_seconds(n),
        'm' => Duration::try_minutes(n),
        'h' => Duration::try_hours(n),
        'd' => Duration::try_days(n),
        _ => None,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_apply_in_development() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.app_env, AppEnv::Development);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.ttls, TokenTtls::default());
        assert_eq!(cfg.dev_bypass_email, None);
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.bind_addr.port(), 8080);
    }

    #[test]
    fn production_requires_secret_and_forbids_bypass() {
        assert_eq!(
            config(&[("APP_ENV", "production")]).unwrap_err(),
            ConfigError::MissingInProduction("JWT_SECRET")
        );
        assert_eq!(
            config(&[("APP_ENV", "production"), ("JWT_SECRET", "s"), ("DEV_BYPASS_AUTH", "true")]).unwrap_err(),
            ConfigError::BypassInProduction
        );
    }

    #[test]
    fn bypass_uses_dev_email() {
        let cfg = config(&[("DEV_BYPASS_AUTH", "1")]).unwrap();
        assert_eq!(cfg.dev_bypass_email.as_deref(), Some(DEFAULT_DEV_USER_EMAIL));

        let cfg = config(&[("DEV_BYPASS_AUTH", "true"), ("DEV_USER_EMAIL", "me@x.com")]).unwrap();
        assert_eq!(cfg.dev_bypass_email.as_deref(), Some("me@x.com"));
    }

    #[test]
    fn ttl_strings() {
        assert_eq!(parse_ttl("30s"), Some(Duration::seconds(30)));
        assert_eq!(parse_ttl("15m"), Some(Duration::minutes(15)));
        assert_eq!(parse_ttl("12h"), Some(Duration::hours(12)));
        assert_eq!(parse_ttl("7d"), Some(Duration::days(7)));
        assert_eq!(parse_ttl("900"), Some(Duration::seconds(900)));
        assert_eq!(parse_ttl("0"), None);
        assert_eq!(parse_ttl("5w"), None);
        assert_eq!(parse_ttl("d"), None);

        assert_eq!(parse_ttl("999999999999d"), None);

        let cfg = config(&[("ACCESS_TOKEN_TTL", "15m")]).unwrap();
        assert_eq!(cfg.ttls.access, Duration::minutes(15));
        assert!(config(&[("REFRESH_TOKEN_TTL", "soon")]).is_err());
    }

    #[test]
    fn oversized_ttls_are_config_errors() {
        for raw in ["999999999999d", "9223372036854775807"] {
            assert!(matches!(
                config(&[("ACCESS_TOKEN_TTL", raw)]),
                Err(ConfigError::Invalid { var: "ACCESS_TOKEN_TTL", .. })
            ));
        }
        // Representable as a Duration but not as a timestamp from now.
        assert!(matches!(
            config(&[("REFRESH_TOKEN_TTL", "9000000000000s")]),
            Err(ConfigError::Invalid { var: "REFRESH_TOKEN_TTL", .. })
        ));
    }
}
