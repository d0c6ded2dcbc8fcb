//! Cross-component integration tests
//!
//! These tests verify interactions between the template engine, the rate
//! limiter, and the counter store without requiring Redis or server
//! startup; everything runs against the in-memory backend.

use std::sync::Arc;

use serde_json::json;

use vesta_asset_service::ratelimit::{Decision, RateLimitConfig, RateLimiter};
use vesta_asset_service::store::{CounterStore, MemoryCounterStore};
use vesta_asset_service::template::{Dataset, TemplateEngine};

/// Create a template engine with a fixture dataset
fn create_engine() -> TemplateEngine {
    let dataset = Dataset::from_value(json!({
        "emoji": {
            "check": "✅",
            "warn": "⚠️"
        },
        "data": {
            "bot": { "name": "vesta", "version": "1.0" },
            "limits": { "burst": 5 }
        }
    }));
    TemplateEngine::new(Arc::new(dataset))
}

/// Create a rate limiter over a fresh memory store
fn create_limiter(threshold: u32) -> (Arc<MemoryCounterStore>, RateLimiter) {
    let store = Arc::new(MemoryCounterStore::new());
    let config = RateLimitConfig {
        enabled: true,
        threshold,
        window_seconds: 60,
        cooldown_seconds: 60,
        tempban_seconds: 3600,
        prefix: "test:ratelimit".to_string(),
    };
    let limiter = RateLimiter::new(store.clone(), config);
    (store, limiter)
}

#[tokio::test]
async fn test_allowed_request_flows_into_expansion() {
    let engine = create_engine();
    let (_, limiter) = create_limiter(5);

    let decision = limiter.check("user-1").await.unwrap();
    assert_eq!(decision, Decision::Allow);

    // Only an allowed request reaches the engine
    let body = engine.expand("{emoji:check} {data:bot.name} v{data:bot.version}");
    assert_eq!(body, "✅ vesta v1.0");
}

#[tokio::test]
async fn test_decision_sequence_for_sustained_burst() {
    let (_, limiter) = create_limiter(3);

    let mut decisions = Vec::new();
    for _ in 0..12 {
        decisions.push(limiter.check("user-1").await.unwrap());
    }

    // 3 allowed, then cooldown entered; 3 counted inside the cooldown,
    // then the second violation escalates and sticks.
    let expected = [
        Decision::Allow,
        Decision::Allow,
        Decision::Allow,
        Decision::Cooldown,
        Decision::Cooldown,
        Decision::Cooldown,
        Decision::Cooldown,
        Decision::Tempban,
        Decision::Tempban,
        Decision::Tempban,
        Decision::Tempban,
        Decision::Tempban,
    ];
    assert_eq!(decisions, expected);
}

#[tokio::test]
async fn test_penalty_flags_never_coexist() {
    let (store, limiter) = create_limiter(2);
    let keys = limiter.keys("user-1");

    for _ in 0..10 {
        limiter.check("user-1").await.unwrap();
        let cooldown = store.exists(&keys.cooldown).await.unwrap();
        let tempban = store.exists(&keys.tempban).await.unwrap();
        assert!(
            !(cooldown && tempban),
            "cooldown and tempban flags must not coexist"
        );
    }
}

#[tokio::test]
async fn test_identities_do_not_interfere() {
    let (_, limiter) = create_limiter(2);

    for _ in 0..5 {
        limiter.check("noisy").await.unwrap();
    }
    assert_eq!(limiter.check("noisy").await.unwrap(), Decision::Cooldown);

    // An unrelated identity still has its full allowance
    assert_eq!(limiter.check("quiet").await.unwrap(), Decision::Allow);
}

#[tokio::test]
async fn test_engine_output_is_stable_across_limiter_state() {
    let engine = create_engine();
    let (_, limiter) = create_limiter(1);

    let first = engine.expand("{repeat2:{count}-}");
    for _ in 0..6 {
        limiter.check("user-1").await.unwrap();
    }
    // Limiter state has no influence on expansion
    assert_eq!(engine.expand("{repeat2:{count}-}"), first);
    assert_eq!(first, "0-1-");
}

#[tokio::test]
async fn test_unresolved_directives_survive_round_trip() {
    let engine = create_engine();

    let once = engine.expand("{data:limits.burst} of {data:limits.unknown}");
    assert_eq!(once, "5 of {data:limits.unknown}");

    // Expansion is idempotent once nothing more resolves
    assert_eq!(engine.expand(&once), once);
}
