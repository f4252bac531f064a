//! Verification store configuration module

use serde::{Deserialize, Serialize};

use super::env_or;

/// Where verification records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map; records are lost on restart
    #[default]
    Memory,
    /// Redis, shared by every instance of the service
    Redis,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            _ => Err(format!("Invalid verification store: {}", s)),
        }
    }
}

/// Verification store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Selected backend
    #[serde(default)]
    pub backend: StoreBackend,

    /// Redis connection URL
    pub url: String,

    /// Prefix prepended to every Redis key
    #[serde(default)]
    pub key_prefix: Option<String>,

    /// Connection attempts before giving up at startup
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,

    /// WATCH/MULTI retries before an update reports contention
    #[serde(default = "default_transaction_retries")]
    pub transaction_retries: u32,

    /// Idle connections kept for WATCH/MULTI updates
    #[serde(default = "default_transaction_pool_size")]
    pub transaction_pool_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: String::from("redis://localhost:6379"),
            key_prefix: None,
            connect_retries: default_connect_retries(),
            transaction_retries: default_transaction_retries(),
            transaction_pool_size: default_transaction_pool_size(),
        }
    }
}

impl CacheConfig {
    /// Load from `VERIFICATION_STORE`, `REDIS_URL`, `REDIS_KEY_PREFIX` and
    /// `REDIS_TRANSACTION_POOL_SIZE`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: env_or("VERIFICATION_STORE", defaults.backend),
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            key_prefix: std::env::var("REDIS_KEY_PREFIX")
                .ok()
                .filter(|prefix| !prefix.trim().is_empty()),
            transaction_pool_size: env_or("REDIS_TRANSACTION_POOL_SIZE", defaults.transaction_pool_size),
            ..defaults
        }
    }

    /// Create a Redis-backed configuration with URL
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: StoreBackend::Redis,
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the key prefix for all cache keys
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Generate a cache key with prefix
    pub fn make_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

fn default_connect_retries() -> u32 {
    3
}

fn default_transaction_retries() -> u32 {
    5
}

fn default_transaction_pool_size() -> usize {
    8
}
