mod assets;
mod health;
mod metrics;

pub use assets::serve_asset;
pub use health::{health, stats};
pub use metrics::metrics_text;
