//! Prometheus exposition endpoint.

use axum::http::StatusCode;

use crate::metrics::encode_metrics;

pub async fn metrics_text() -> Result<String, StatusCode> {
    encode_metrics().map_err(|e| {
        tracing::error!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
