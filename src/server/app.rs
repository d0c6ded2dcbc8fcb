use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::{health, metrics_text, serve_asset, stats};

use super::middleware::{api_key_auth, rate_limit_middleware};
use super::AppState;

pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Asset requests pass authentication, then rate limiting
    let assets = Router::new()
        .route("/{*path}", get(serve_asset))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), api_key_auth));

    Router::new()
        // Health & observability (not rate limited)
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(metrics_text))
        .merge(assets)
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Add state
        .with_state(state)
}
