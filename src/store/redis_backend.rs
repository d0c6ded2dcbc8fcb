//! Redis-backed counter store.

use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tokio::sync::RwLock;

use super::{CounterStore, StoreError};

/// Counter store backed by a shared Redis instance.
///
/// Holds one multiplexed connection, established lazily on first use and
/// re-established after connection-dropped or IO errors. All keys rely on
/// Redis TTL auto-expiry; nothing here runs a cleanup sweep.
pub struct RedisCounterStore {
    /// Redis client for creating connections
    client: Client,

    /// Multiplexed connection (shared across tasks)
    connection: RwLock<Option<MultiplexedConnection>>,
}

impl RedisCounterStore {
    /// Create a new store for the given Redis URL.
    ///
    /// The URL is validated here; the connection itself is opened on the
    /// first operation.
    pub fn new(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url)?;
        Ok(Self {
            client,
            connection: RwLock::new(None),
        })
    }

    /// Get the shared connection, establishing it if needed.
    async fn get_connection(&self) -> Result<MultiplexedConnection, StoreError> {
        {
            let conn = self.connection.read().await;
            if let Some(ref c) = *conn {
                return Ok(c.clone());
            }
        }

        self.connect().await
    }

    /// Establish a new connection.
    async fn connect(&self) -> Result<MultiplexedConnection, StoreError> {
        let mut conn_guard = self.connection.write().await;

        // Double-check in case another task connected while we waited
        if let Some(ref c) = *conn_guard {
            return Ok(c.clone());
        }

        match self.client.get_multiplexed_tokio_connection().await {
            Ok(conn) => {
                *conn_guard = Some(conn.clone());
                tracing::info!("Redis counter store connection established");
                Ok(conn)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to Redis");
                Err(StoreError::Redis(e))
            }
        }
    }

    /// Drop the cached connection after an error that indicates it is dead,
    /// so the next operation reconnects.
    async fn invalidate_on(&self, error: &redis::RedisError) {
        if error.is_connection_dropped() || error.is_io_error() {
            let mut conn_guard = self.connection.write().await;
            *conn_guard = None;
        }
    }
}

#[async_trait::async_trait]
impl CounterStore for RedisCounterStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.get_connection().await?;

        match conn.exists(key).await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.invalidate_on(&e).await;
                Err(StoreError::Redis(e))
            }
        }
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.get_connection().await?;

        match conn.incr(key, 1i64).await {
            Ok(count) => Ok(count),
            Err(e) => {
                self.invalidate_on(&e).await;
                Err(StoreError::Redis(e))
            }
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;

        match conn.expire::<_, ()>(key, ttl.as_secs() as i64).await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.invalidate_on(&e).await;
                Err(StoreError::Redis(e))
            }
        }
    }

    async fn set_flag(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;

        match conn.set_ex::<_, _, ()>(key, 1i64, ttl.as_secs()).await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.invalidate_on(&e).await;
                Err(StoreError::Redis(e))
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;

        match conn.del::<_, ()>(key).await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.invalidate_on(&e).await;
                Err(StoreError::Redis(e))
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_creation() {
        let store = RedisCounterStore::new("redis://localhost:6379");
        assert!(store.is_ok());
        assert_eq!(store.unwrap().backend_name(), "redis");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(RedisCounterStore::new("not-a-redis-url").is_err());
    }
}
