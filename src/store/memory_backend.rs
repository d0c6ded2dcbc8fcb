//! In-memory counter store.

use std::time::Duration;

use dashmap::DashMap;

use super::{current_time_ms, CounterStore, StoreError};

/// Stored value with optional expiry timestamp (ms since epoch).
#[derive(Debug, Clone, Copy)]
struct Entry {
    value: i64,
    expires_at_ms: Option<i64>,
}

impl Entry {
    fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.expires_at_ms, Some(deadline) if deadline <= now_ms)
    }
}

/// Process-local counter store with lazy TTL expiry.
///
/// Expired entries are dropped when next touched rather than by a background
/// sweep, mirroring the auto-expiry semantics of the Redis backend. Intended
/// for tests and single-instance deployments; counters are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    entries: DashMap<String, Entry>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        let now = current_time_ms();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    /// Whether the store holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl CounterStore for MemoryCounterStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let now = current_time_ms();
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(self.entries.contains_key(key))
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let now = current_time_ms();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(Entry {
                value: 0,
                expires_at_ms: None,
            });
        if entry.is_expired(now) {
            *entry = Entry {
                value: 0,
                expires_at_ms: None,
            };
        }
        entry.value += 1;
        Ok(entry.value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let deadline = current_time_ms() + ttl.as_millis() as i64;
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.expires_at_ms = Some(deadline);
        }
        Ok(())
    }

    async fn set_flag(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let deadline = current_time_ms() + ttl.as_millis() as i64;
        self.entries.insert(
            key.to_string(),
            Entry {
                value: 1,
                expires_at_ms: Some(deadline),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_creates_and_counts() {
        tokio_test::block_on(async {
            let store = MemoryCounterStore::new();
            assert_eq!(store.increment("k").await.unwrap(), 1);
            assert_eq!(store.increment("k").await.unwrap(), 2);
            assert_eq!(store.increment("other").await.unwrap(), 1);
        });
    }

    #[test]
    fn test_exists_and_delete() {
        tokio_test::block_on(async {
            let store = MemoryCounterStore::new();
            assert!(!store.exists("k").await.unwrap());
            store.increment("k").await.unwrap();
            assert!(store.exists("k").await.unwrap());
            store.delete("k").await.unwrap();
            assert!(!store.exists("k").await.unwrap());
        });
    }

    #[test]
    fn test_flag_expires() {
        tokio_test::block_on(async {
            let store = MemoryCounterStore::new();
            store
                .set_flag("flag", Duration::from_millis(20))
                .await
                .unwrap();
            assert!(store.exists("flag").await.unwrap());

            std::thread::sleep(Duration::from_millis(40));
            assert!(!store.exists("flag").await.unwrap());
            assert!(store.is_empty());
        });
    }

    #[test]
    fn test_counter_resets_after_expiry() {
        tokio_test::block_on(async {
            let store = MemoryCounterStore::new();
            store.increment("k").await.unwrap();
            store.increment("k").await.unwrap();
            store.expire("k", Duration::from_millis(20)).await.unwrap();

            std::thread::sleep(Duration::from_millis(40));
            // The expired counter restarts from scratch, as in Redis.
            assert_eq!(store.increment("k").await.unwrap(), 1);
        });
    }

    #[test]
    fn test_expire_on_missing_key_is_noop() {
        tokio_test::block_on(async {
            let store = MemoryCounterStore::new();
            store.expire("ghost", Duration::from_secs(1)).await.unwrap();
            assert!(!store.exists("ghost").await.unwrap());
        });
    }
}
