use std::sync::{Arc, Mutex};

use reqwest::Client;

use super::{cache::ContentCache, config::Config, datasets::Registry};

pub struct AppState {
    pub config: Config,
    pub registry: Registry,
    pub cache: Mutex<ContentCache>,
    pub http: Client,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Self::with(Config::load(), Registry::default())
    }

    /// Explicit construction, used at startup and by the tests.
    pub fn with(config: Config, registry: Registry) -> Arc<Self> {
        Arc::new(Self {
            config,
            registry,
            cache: Mutex::new(ContentCache::new()),
            http: Client::new(),
        })
    }

    /// Attach error detail only when the environment asks for verbose errors.
    pub fn error_detail(&self, error: &dyn std::error::Error) -> Option<String> {
        self.config.verbose_errors().then(|| error.to_string())
    }
}
