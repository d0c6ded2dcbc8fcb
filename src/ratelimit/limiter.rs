//! Penalty state machine evaluated against the counter store.

use std::sync::Arc;
use std::time::Duration;

use crate::store::{CounterStore, StoreError};

use super::config::RateLimitConfig;
use super::Decision;

/// Storage keys holding one identity's rate limit state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateKeys {
    /// Request count within the current window (TTL = window length)
    pub count: String,
    /// Cooldown presence flag (TTL = cooldown duration)
    pub cooldown: String,
    /// Tempban presence flag (TTL = tempban duration)
    pub tempban: String,
}

/// Rate limiter enforcing the window/cooldown/tempban policy.
///
/// `check` issues several dependent store operations that are not wrapped in
/// a transaction: two concurrent requests for the same identity can both
/// observe "no flag yet" and both increment, admitting slightly more than
/// the threshold under race. That over-admission is accepted; each call
/// still returns exactly one decision and takes exactly one mutation path.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter over the given store.
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// Whether rate limiting is enforced.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// The configuration
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Storage keys for an identity (exposed for operational tooling).
    pub fn keys(&self, identity: &str) -> RateKeys {
        RateKeys {
            count: format!("{}:count:{}", self.config.prefix, identity),
            cooldown: format!("{}:cooldown:{}", self.config.prefix, identity),
            tempban: format!("{}:tempban:{}", self.config.prefix, identity),
        }
    }

    /// Evaluate one request for `identity`.
    ///
    /// Checked in strict order: an active tempban wins and mutates nothing;
    /// an active cooldown counts the request and escalates to a tempban once
    /// the count passes the threshold again; otherwise the request counts
    /// against the window and tips into a cooldown past the threshold.
    pub async fn check(&self, identity: &str) -> Result<Decision, StoreError> {
        if !self.config.enabled {
            return Ok(Decision::Allow);
        }

        let keys = self.keys(identity);

        if self.store.exists(&keys.tempban).await? {
            return Ok(Decision::Tempban);
        }

        if self.store.exists(&keys.cooldown).await? {
            let count = self.bump(&keys.count).await?;
            if count > i64::from(self.config.threshold) {
                self.store
                    .set_flag(&keys.tempban, Duration::from_secs(self.config.tempban_seconds))
                    .await?;
                self.store.delete(&keys.count).await?;
                self.store.delete(&keys.cooldown).await?;
                tracing::warn!(
                    identity = %identity,
                    count = count,
                    "Cooldown violated, escalating to tempban"
                );
                return Ok(Decision::Tempban);
            }
            return Ok(Decision::Cooldown);
        }

        let count = self.bump(&keys.count).await?;
        if count > i64::from(self.config.threshold) {
            self.store.delete(&keys.count).await?;
            self.store
                .set_flag(&keys.cooldown, Duration::from_secs(self.config.cooldown_seconds))
                .await?;
            tracing::warn!(
                identity = %identity,
                count = count,
                "Request threshold exceeded, entering cooldown"
            );
            return Ok(Decision::Cooldown);
        }

        Ok(Decision::Allow)
    }

    /// Increment the window counter, arming its TTL when newly created.
    async fn bump(&self, count_key: &str) -> Result<i64, StoreError> {
        let count = self.store.increment(count_key).await?;
        if count == 1 {
            self.store
                .expire(count_key, Duration::from_secs(self.config.window_seconds))
                .await?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCounterStore;

    fn limiter(threshold: u32) -> (Arc<MemoryCounterStore>, RateLimiter) {
        let store = Arc::new(MemoryCounterStore::new());
        let config = RateLimitConfig {
            threshold,
            window_seconds: 60,
            cooldown_seconds: 60,
            tempban_seconds: 3600,
            ..Default::default()
        };
        (store.clone(), RateLimiter::new(store, config))
    }

    #[tokio::test]
    async fn test_allows_up_to_threshold() {
        let (_, limiter) = limiter(3);

        for _ in 0..3 {
            assert_eq!(limiter.check("alice").await.unwrap(), Decision::Allow);
        }
        assert_eq!(limiter.check("alice").await.unwrap(), Decision::Cooldown);
    }

    #[tokio::test]
    async fn test_cooldown_persists_for_moderate_traffic() {
        let (_, limiter) = limiter(3);

        for _ in 0..4 {
            limiter.check("alice").await.unwrap();
        }
        // Within the cooldown, requests below the threshold stay Cooldown.
        for _ in 0..3 {
            assert_eq!(limiter.check("alice").await.unwrap(), Decision::Cooldown);
        }
    }

    #[tokio::test]
    async fn test_cooldown_violation_escalates_to_tempban() {
        let (_, limiter) = limiter(3);

        for _ in 0..4 {
            limiter.check("alice").await.unwrap();
        }
        for _ in 0..3 {
            assert_eq!(limiter.check("alice").await.unwrap(), Decision::Cooldown);
        }
        // The call pushing the in-cooldown count past the threshold escalates.
        assert_eq!(limiter.check("alice").await.unwrap(), Decision::Tempban);
    }

    #[tokio::test]
    async fn test_tempban_is_sticky() {
        let (_, limiter) = limiter(1);

        for _ in 0..2 {
            limiter.check("alice").await.unwrap();
        }
        for _ in 0..2 {
            limiter.check("alice").await.unwrap();
        }
        for _ in 0..10 {
            assert_eq!(limiter.check("alice").await.unwrap(), Decision::Tempban);
        }
    }

    #[tokio::test]
    async fn test_penalty_flags_are_mutually_exclusive() {
        let (store, limiter) = limiter(2);
        let keys = limiter.keys("alice");

        for _ in 0..3 {
            limiter.check("alice").await.unwrap();
        }
        assert!(store.exists(&keys.cooldown).await.unwrap());
        assert!(!store.exists(&keys.tempban).await.unwrap());

        for _ in 0..3 {
            limiter.check("alice").await.unwrap();
        }
        assert!(store.exists(&keys.tempban).await.unwrap());
        assert!(!store.exists(&keys.cooldown).await.unwrap());
    }

    #[tokio::test]
    async fn test_escalation_clears_window_counter() {
        let (store, limiter) = limiter(2);
        let keys = limiter.keys("alice");

        for _ in 0..3 {
            limiter.check("alice").await.unwrap();
        }
        for _ in 0..3 {
            limiter.check("alice").await.unwrap();
        }
        assert_eq!(limiter.check("alice").await.unwrap(), Decision::Tempban);
        assert!(!store.exists(&keys.count).await.unwrap());
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let (_, limiter) = limiter(2);

        for _ in 0..3 {
            limiter.check("alice").await.unwrap();
        }
        assert_eq!(limiter.check("alice").await.unwrap(), Decision::Cooldown);
        assert_eq!(limiter.check("bob").await.unwrap(), Decision::Allow);
    }

    #[tokio::test]
    async fn test_disabled_limiter_always_allows() {
        let store = Arc::new(MemoryCounterStore::new());
        let config = RateLimitConfig {
            enabled: false,
            threshold: 1,
            ..Default::default()
        };
        let limiter = RateLimiter::new(store.clone(), config);

        for _ in 0..50 {
            assert_eq!(limiter.check("alice").await.unwrap(), Decision::Allow);
        }
        // Nothing is written when disabled.
        assert!(store.is_empty());
    }
}
