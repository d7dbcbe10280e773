//! Key-value cache probe.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::config::{CacheConfig, CACHE_PROBE_KEY, CACHE_PROBE_VALUE};
use crate::error::ProbeError;

use super::Probe;

/// Writes [`CACHE_PROBE_KEY`] and reads it back over a fresh connection.
///
/// Repeated runs overwrite the same key with the same value, so the probe is
/// safe to call on every request.
#[derive(Debug, Clone)]
pub struct RedisProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl RedisProbe {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            timeout: config.timeout(),
        }
    }
}

#[async_trait]
impl Probe for RedisProbe {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn check(&self) -> Result<(), ProbeError> {
        let client = redis::Client::open((self.host.clone(), self.port))?;
        let mut conn = client.get_multiplexed_async_connection().await?;

        let _: () = conn.set(CACHE_PROBE_KEY, CACHE_PROBE_VALUE).await?;
        let actual: Option<String> = conn.get(CACHE_PROBE_KEY).await?;

        verify_read_back(actual)
    }
}

fn verify_read_back(actual: Option<String>) -> Result<(), ProbeError> {
    match actual {
        Some(ref value) if value == CACHE_PROBE_VALUE => Ok(()),
        _ => Err(ProbeError::Mismatch {
            expected: CACHE_PROBE_VALUE.to_string(),
            actual,
        }),
    }
}
