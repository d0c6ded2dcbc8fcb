use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::ratelimit::RateLimitConfig;
use crate::store::StoreConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ratelimit: RateLimitConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub prerender: PrerenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Static API key membership.
///
/// An empty key list disables the check (development mode); any configured
/// key grants access when presented in `X-API-Key`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Directory served to clients
    #[serde(default = "default_content_root")]
    pub root: String,
    /// Dataset file name, looked up under the content root first
    #[serde(default = "default_dataset_file")]
    pub dataset_file: String,
}

/// Source trees rendered by the `prerender` binary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrerenderConfig {
    /// Directories whose text files are expanded into the content root
    #[serde(default)]
    pub sources: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_content_root() -> String {
    "public".to_string()
}

fn default_dataset_file() -> String {
    "data.json".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("store.url", "redis://localhost:6379")?
            .set_default("content.root", "public")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // SERVER_HOST, SERVER_PORT, API_KEYS, STORE_URL, etc.
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true)
                    .list_separator(","),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: default_content_root(),
            dataset_file: default_dataset_file(),
        }
    }
}
