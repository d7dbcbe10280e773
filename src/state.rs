//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::probe::{MySqlProbe, Probe, RedisProbe};

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds the immutable configuration and the two probes run on every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: Arc<dyn Probe>,
    pub database: Arc<dyn Probe>,
}

impl AppState {
    /// Creates state with the Redis and MySQL probes built from `config`.
    pub fn new(config: AppConfig) -> Self {
        let cache = Arc::new(RedisProbe::new(&config.cache));
        let database = Arc::new(MySqlProbe::new(&config.database));
        Self::with_probes(config, cache, database)
    }

    /// Creates state with caller-supplied probes.
    pub fn with_probes(config: AppConfig, cache: Arc<dyn Probe>, database: Arc<dyn Probe>) -> Self {
        Self {
            config: Arc::new(config),
            cache,
            database,
        }
    }
}
