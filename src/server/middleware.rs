use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::metrics::RateLimitMetrics;
use crate::ratelimit::Decision;

/// API Key authentication middleware
/// Validates X-API-Key header against the configured key set
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    // If no API keys are configured, allow all requests (development mode)
    if state.settings.api.keys.is_empty() {
        return Ok(next.run(req).await);
    }

    // Check X-API-Key header
    let api_key = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());

    match api_key {
        Some(key) if state.settings.api.keys.iter().any(|k| k == key) => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing API key header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Caller identity carried in the query string.
#[derive(Debug, Deserialize)]
pub struct IdentityQuery {
    pub id: String,
}

/// Rate limiting middleware for asset requests.
///
/// Uses the `id` query parameter as the rate limit identity. Cooldown maps
/// to 429 and tempban to 403, both with an `X-Type` marker header; store
/// failures fail closed with 503.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    Query(query): Query<IdentityQuery>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match state.rate_limiter.check(&query.id).await {
        Ok(decision) => {
            RateLimitMetrics::record_decision(decision.as_str());
            match decision {
                Decision::Allow => next.run(req).await,
                Decision::Cooldown => {
                    tracing::warn!(identity = %query.id, "Request rejected, cooldown active");
                    penalty_response(
                        StatusCode::TOO_MANY_REQUESTS,
                        "cooldown",
                        "Too many requests, cooling down",
                        state.rate_limiter.config().cooldown_seconds,
                    )
                }
                Decision::Tempban => {
                    tracing::warn!(identity = %query.id, "Request rejected, tempban active");
                    penalty_response(
                        StatusCode::FORBIDDEN,
                        "tempban",
                        "Temporarily banned",
                        state.rate_limiter.config().tempban_seconds,
                    )
                }
            }
        }
        Err(e) => {
            RateLimitMetrics::record_store_error();
            crate::error::AppError::Store(e).into_response()
        }
    }
}

/// Build a penalty response with the marker and retry headers.
fn penalty_response(status: StatusCode, marker: &str, message: &str, retry_after: u64) -> Response {
    let body = json!({
        "error": {
            "code": "RATE_LIMITED",
            "message": message
        }
    });

    let mut response = (status, Json(body)).into_response();

    let headers = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(marker) {
        headers.insert("X-Type", v);
    }
    if let Ok(v) = HeaderValue::from_str(&retry_after.to_string()) {
        headers.insert("Retry-After", v);
    }

    response
}
