//! Offline renderer: expands the configured template trees into the
//! content root so the server can hand out pre-rendered copies.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vesta_asset_service::config::Settings;
use vesta_asset_service::prerender;
use vesta_asset_service::template::{Dataset, TemplateEngine};

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new()?;
    if settings.prerender.sources.is_empty() {
        tracing::warn!("No prerender sources configured, nothing to do");
        return Ok(());
    }

    let dataset = Arc::new(Dataset::discover(&settings.content)?);
    let engine = TemplateEngine::new(dataset);

    let stats = prerender::run(&engine, &settings.prerender, &settings.content)?;
    tracing::info!(
        rendered = stats.rendered,
        skipped = stats.skipped,
        "Render finished"
    );
    Ok(())
}
