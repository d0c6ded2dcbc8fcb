//! Prometheus metrics for the asset service.
//!
//! Covers the request path end to end:
//! - Rate limit decisions by outcome
//! - Counter store errors
//! - Assets served by kind
//! - Template expansion latency

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "vesta";

lazy_static! {
    /// Rate limit decisions by outcome
    pub static ref RATELIMIT_DECISIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_ratelimit_decisions_total", METRIC_PREFIX),
        "Rate limit decisions by outcome",
        &["decision"]
    ).unwrap();

    /// Counter store failures observed on the request path
    pub static ref STORE_ERRORS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_store_errors_total", METRIC_PREFIX),
        "Counter store failures observed on the request path"
    ).unwrap();

    /// Assets served by kind
    pub static ref ASSETS_SERVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_assets_served_total", METRIC_PREFIX),
        "Assets served by kind",
        &["kind"]
    ).unwrap();

    /// Template expansion latency
    pub static ref TEMPLATE_EXPAND_SECONDS: Histogram = register_histogram!(
        format!("{}_template_expand_seconds", METRIC_PREFIX),
        "Template expansion latency in seconds",
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]
    ).unwrap();
}

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording rate limit metrics
pub struct RateLimitMetrics;

impl RateLimitMetrics {
    /// Record a decision by its outcome label
    pub fn record_decision(decision: &str) {
        RATELIMIT_DECISIONS_TOTAL.with_label_values(&[decision]).inc();
    }

    /// Record a counter store failure
    pub fn record_store_error() {
        STORE_ERRORS_TOTAL.inc();
    }

    /// Snapshot of decision counters for the stats endpoint
    pub fn snapshot() -> RateLimitSnapshot {
        RateLimitSnapshot {
            allowed: RATELIMIT_DECISIONS_TOTAL.with_label_values(&["allow"]).get(),
            cooldowns: RATELIMIT_DECISIONS_TOTAL
                .with_label_values(&["cooldown"])
                .get(),
            tempbans: RATELIMIT_DECISIONS_TOTAL
                .with_label_values(&["tempban"])
                .get(),
            store_errors: STORE_ERRORS_TOTAL.get(),
        }
    }
}

/// Decision counter snapshot
#[derive(Debug, Clone, Copy)]
pub struct RateLimitSnapshot {
    pub allowed: u64,
    pub cooldowns: u64,
    pub tempbans: u64,
    pub store_errors: u64,
}

/// Helper struct for recording asset metrics
pub struct AssetMetrics;

impl AssetMetrics {
    /// Record a served asset by kind label
    pub fn record_served(kind: &str) {
        ASSETS_SERVED_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Time a template expansion
    pub fn observe_expand_seconds(seconds: f64) {
        TEMPLATE_EXPAND_SECONDS.observe(seconds);
    }
}
