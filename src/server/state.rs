use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::error::AppError;
use crate::ratelimit::RateLimiter;
use crate::store::{create_counter_store, CounterStore};
use crate::template::{Dataset, TemplateEngine};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub engine: Arc<TemplateEngine>,
    pub rate_limiter: Arc<RateLimiter>,
    pub store: Arc<dyn CounterStore>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, AppError> {
        let dataset = Arc::new(Dataset::discover(&settings.content)?);
        let engine = Arc::new(TemplateEngine::new(dataset));
        let store = create_counter_store(&settings.store)?;
        let rate_limiter = Arc::new(RateLimiter::new(store.clone(), settings.ratelimit.clone()));

        Ok(Self {
            settings: Arc::new(settings),
            engine,
            rate_limiter,
            store,
            start_time: Instant::now(),
        })
    }
}
