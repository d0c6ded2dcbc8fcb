//! Shared counter store backing the rate limiter.
//!
//! The store is a string-keyed key/expiry space with TTL-based auto-expiry;
//! counters are never swept explicitly. Two backends exist:
//!
//! - `RedisCounterStore`: shared across instances, the production backend
//! - `MemoryCounterStore`: process-local, for tests and single-instance runs
//!
//! Store failures are the only error class the rate limiter surfaces. They
//! always propagate as [`StoreError`] so the HTTP layer can pick a policy;
//! they are never folded into an allow/deny decision here.

mod memory_backend;
mod redis_backend;

pub use memory_backend::MemoryCounterStore;
pub use redis_backend::RedisCounterStore;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// Error type for counter store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Redis operation failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Store not reachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Key/expiry store operations used by the rate limiter.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Whether the key currently exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Increment the integer at `key`, creating it at 1 if absent.
    /// Returns the post-increment value.
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    /// Set the remaining time-to-live of an existing key.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Set a presence flag that auto-expires after `ttl`.
    async fn set_flag(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Delete the key if present.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check reachability (for health reporting).
    async fn ping(&self) -> Result<(), StoreError>;

    /// Backend name for health/stats reporting.
    fn backend_name(&self) -> &'static str;
}

/// Counter store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Backend type: "redis" or "memory"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub url: String,
}

fn default_backend() -> String {
    "redis".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_redis_url(),
        }
    }
}

/// Create a counter store based on configuration.
///
/// `"redis"` returns a [`RedisCounterStore`] (connection established lazily
/// on first use); any other value returns a [`MemoryCounterStore`].
pub fn create_counter_store(config: &StoreConfig) -> Result<Arc<dyn CounterStore>, StoreError> {
    match config.backend.as_str() {
        "redis" => {
            tracing::info!(url = %config.url, "Creating Redis counter store");
            Ok(Arc::new(RedisCounterStore::new(&config.url)?))
        }
        other => {
            tracing::info!(backend = %other, "Creating in-memory counter store");
            Ok(Arc::new(MemoryCounterStore::new()))
        }
    }
}

/// Get current time in milliseconds since epoch
pub(crate) fn current_time_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.backend, "redis");
        assert_eq!(config.url, "redis://localhost:6379");
    }

    #[test]
    fn test_factory_memory_backend() {
        let config = StoreConfig {
            backend: "memory".to_string(),
            ..Default::default()
        };
        let store = create_counter_store(&config).unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[test]
    fn test_factory_redis_backend() {
        let config = StoreConfig::default();
        let store = create_counter_store(&config).unwrap();
        assert_eq!(store.backend_name(), "redis");
    }
}
