//! Asset serving handler.

use std::path::Path;
use std::time::Instant;

use axum::{
    extract::{Path as UrlPath, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::content::{sandbox_path, FileKind};
use crate::error::{AppError, Result};
use crate::metrics::AssetMetrics;
use crate::server::AppState;

/// Serve one file from the content root.
///
/// The request has already passed authentication and rate limiting. The
/// path is confined to the content root, then dispatched on extension:
/// JSON is parsed and re-served, textual files go through the template
/// engine, everything else streams back verbatim.
pub async fn serve_asset(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> Result<Response> {
    let root = Path::new(&state.settings.content.root);
    let resolved = sandbox_path(root, &path)?;
    let kind = FileKind::from_path(&resolved);

    let response = match kind {
        FileKind::Json => {
            let raw = read_text(&resolved).await?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|e| AppError::Internal(format!("Malformed JSON asset: {}", e)))?;
            Json(value).into_response()
        }
        FileKind::Text => {
            let raw = read_text(&resolved).await?;
            let started = Instant::now();
            let expanded = state.engine.expand(&raw);
            AssetMetrics::observe_expand_seconds(started.elapsed().as_secs_f64());
            (
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                expanded,
            )
                .into_response()
        }
        FileKind::Binary => {
            let bytes = tokio::fs::read(&resolved)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to read asset: {}", e)))?;
            (
                [(header::CONTENT_TYPE, "application/octet-stream")],
                bytes,
            )
                .into_response()
        }
    };

    AssetMetrics::record_served(kind.as_str());
    Ok(response)
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read asset: {}", e)))
}
