//! Backing-store probes.
//!
//! A probe performs one write/read round-trip against a dependency and yields a
//! pass/fail verdict. Probes return `Result<(), ProbeError>`; the verdict is
//! derived at the call site by [`run`], which also enforces the probe's timeout.

mod cache;
mod database;

pub use cache::RedisProbe;
pub use database::{DatabaseDriver, MySqlProbe};

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::timeout;

use crate::error::ProbeError;

/// Verdict for a single dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Passed,
    Failed,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Passed => write!(f, "passed"),
            ProbeStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A single round-trip check against a dependency.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Upper bound on the whole check
    fn timeout(&self) -> Duration;

    /// Perform the round-trip. Any `Err` means the dependency is unhealthy.
    async fn check(&self) -> Result<(), ProbeError>;
}

/// Result of running a probe under its timeout
#[derive(Debug)]
pub struct ProbeOutcome {
    pub status: ProbeStatus,
    pub error: Option<ProbeError>,
}

impl ProbeOutcome {
    fn passed() -> Self {
        Self {
            status: ProbeStatus::Passed,
            error: None,
        }
    }

    fn failed(error: ProbeError) -> Self {
        Self {
            status: ProbeStatus::Failed,
            error: Some(error),
        }
    }
}

/// Run `probe`, bounding it by its timeout and collapsing every error to `Failed`.
pub async fn run(probe: &dyn Probe) -> ProbeOutcome {
    let limit = probe.timeout();
    let start = Instant::now();

    let result = match timeout(limit, probe.check()).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(limit)),
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => {
            tracing::debug!(probe = probe.name(), duration_ms, "Probe passed");
            ProbeOutcome::passed()
        }
        Err(e) => {
            tracing::warn!(probe = probe.name(), duration_ms, error = %e, "Probe failed");
            ProbeOutcome::failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe {
        result: fn() -> Result<(), ProbeError>,
        delay: Duration,
    }

    #[async_trait]
    impl Probe for FixedProbe {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(50)
        }

        async fn check(&self) -> Result<(), ProbeError> {
            tokio::time::sleep(self.delay).await;
            (self.result)()
        }
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ProbeStatus::Passed.to_string(), "passed");
        assert_eq!(ProbeStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProbeStatus::Passed).unwrap(),
            "\"passed\""
        );
        assert_eq!(
            serde_json::to_string(&ProbeStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    #[tokio::test]
    async fn test_run_passed() {
        let probe = FixedProbe {
            result: || Ok(()),
            delay: Duration::ZERO,
        };
        let outcome = run(&probe).await;
        assert_eq!(outcome.status, ProbeStatus::Passed);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_run_error_maps_to_failed() {
        let probe = FixedProbe {
            result: || Err(ProbeError::RowCount(2)),
            delay: Duration::ZERO,
        };
        let outcome = run(&probe).await;
        assert_eq!(outcome.status, ProbeStatus::Failed);
        assert!(matches!(outcome.error, Some(ProbeError::RowCount(2))));
    }

    #[tokio::test]
    async fn test_run_timeout_maps_to_failed() {
        let probe = FixedProbe {
            result: || Ok(()),
            delay: Duration::from_secs(10),
        };
        let outcome = run(&probe).await;
        assert_eq!(outcome.status, ProbeStatus::Failed);
        assert!(matches!(outcome.error, Some(ProbeError::Timeout(_))));
    }
}
