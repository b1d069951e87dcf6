use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use forum_core::store::CouchConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signing secret used when none is configured in development
const DEV_JWT_SECRET: &str = "dev-mode-secret-not-for-production-use-123456";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("{0} is required outside development")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Environment {
    #[serde(rename = "development")]
    Development,
    #[serde(rename = "production")]
    Production,
    #[serde(rename = "test")]
    Test,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Which record store backend to run against
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreBackend {
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "couchdb")]
    CouchDb,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(StoreBackend::Memory),
            "couchdb" => Ok(StoreBackend::CouchDb),
            other => Err(format!("unknown store '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub environment: Environment,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// Only origin allowed by CORS
    pub cors_origin: HeaderValue,
    pub store: StoreBackend,
    pub couch_url: String,
    pub couch_database: String,
    pub couch_user: Option<String>,
    pub couch_password: Option<String>,
    pub store_timeout: Duration,
    pub connect_retries: u32,
    pub connect_delay: Duration,
    pub admin_users: Vec<String>,
    pub body_limit: usize,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let environment = parse(&var, "ENVIRONMENT", Environment::Development)?;

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(ConfigError::Invalid {
                    name: "JWT_SECRET",
                    reason: format!("must be at least {MIN_SECRET_LEN} characters"),
                })
            }
            Some(secret) => secret,
            None if environment != Environment::Development => {
                return Err(ConfigError::Missing("JWT_SECRET"))
            }
            None => DEV_JWT_SECRET.to_string(),
        };

        let admin_users = var("ADMIN_USERS")
            .unwrap_or_else(|| "admin".to_string())
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            bind_addr: parse(&var, "BIND_ADDR", IpAddr::from([0, 0, 0, 0]))?,
            port: parse(&var, "PORT", 3001)?,
            environment,
            jwt_secret,
            token_ttl: Duration::from_secs(parse(&var, "TOKEN_TTL_SECS", 86_400)?),
            cors_origin: parse(&var, "CORS_ORIGIN", HeaderValue::from_static("http://localhost:3000"))?,
            store: parse(&var, "FORUM_STORE", StoreBackend::Memory)?,
            couch_url: var("COUCHDB_URL").unwrap_or_else(|| "http://localhost:5984".to_string()),
            couch_database: var("COUCHDB_DATABASE").unwrap_or_else(|| "postsdb".to_string()),
            couch_user: var("COUCHDB_USER"),
            couch_password: var("COUCHDB_PASSWORD"),
            store_timeout: Duration::from_millis(parse(&var, "STORE_TIMEOUT_MS", 5_000)?),
            connect_retries: parse(&var, "STORE_CONNECT_RETRIES", 5)?,
            connect_delay: Duration::from_millis(parse(&var, "STORE_CONNECT_DELAY_MS", 3_000)?),
            admin_users,
            body_limit: parse(&var, "BODY_LIMIT_BYTES", 10 * 1024 * 1024)?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn couch_config(&self) -> CouchConfig {
        CouchConfig {
            url: self.couch_url.clone(),
            database: self.couch_database.clone(),
            username: self.couch_user.clone(),
            password: self.couch_password.clone(),
            timeout: self.store_timeout,
            connect_retries: self.connect_retries,
            connect_delay: self.connect_delay,
            ..CouchConfig::default()
        }
    }
}

fn parse<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
