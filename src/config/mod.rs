mod settings;

pub use settings::{ApiConfig, ContentConfig, PrerenderConfig, ServerConfig, Settings};
