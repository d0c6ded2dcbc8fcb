//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::metrics::RateLimitMetrics;
use crate::server::AppState;
use crate::store::CounterStore;
use crate::template::Namespace;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: StoreHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct StoreHealthResponse {
    pub backend: String,
    pub reachable: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub ratelimit: RateLimitStats,
    pub dataset: DatasetStats,
}

#[derive(Debug, Serialize)]
pub struct RateLimitStats {
    pub enabled: bool,
    pub threshold: u32,
    pub allowed: u64,
    pub cooldowns: u64,
    pub tempbans: u64,
    pub store_errors: u64,
}

#[derive(Debug, Serialize)]
pub struct DatasetStats {
    pub emoji_entries: usize,
    pub data_entries: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let reachable = state.store.ping().await.is_ok();
    let status = if reachable { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store: StoreHealthResponse {
            backend: state.store.backend_name().to_string(),
            reachable,
        },
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = RateLimitMetrics::snapshot();
    let config = state.rate_limiter.config();
    let dataset = state.engine.dataset();

    Json(StatsResponse {
        ratelimit: RateLimitStats {
            enabled: config.enabled,
            threshold: config.threshold,
            allowed: snapshot.allowed,
            cooldowns: snapshot.cooldowns,
            tempbans: snapshot.tempbans,
            store_errors: snapshot.store_errors,
        },
        dataset: DatasetStats {
            emoji_entries: dataset.namespace_len(Namespace::Emoji),
            data_entries: dataset.namespace_len(Namespace::Data),
        },
    })
}
