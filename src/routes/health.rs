//! Health report endpoint.
//!
//! Every request runs both probes live; nothing is cached between requests.
//! The response is always 200 with a JSON body, whatever the probes report.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::instrument;

use crate::probe::{self, ProbeStatus};
use crate::state::AppState;

pub const NODE_NAME_KEY: &str = "Node Name";
pub const CACHE_KEY: &str = "Redis Test";
pub const DATABASE_KEY: &str = "RDS Test";

/// Per-request report. Field order is the JSON key order.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    #[serde(rename = "Node Name")]
    pub node_name: String,
    #[serde(rename = "Redis Test")]
    pub cache_status: ProbeStatus,
    #[serde(rename = "RDS Test")]
    pub database_status: ProbeStatus,
    /// Failure reasons keyed like the status fields; only filled in verbose mode
    #[serde(rename = "Errors", skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<&'static str, String>,
}

/// Health report handler.
///
/// Runs the cache and database probes concurrently; they touch disjoint stores.
#[instrument(name = "health::report", skip(state))]
pub async fn report(State(state): State<AppState>) -> Json<HealthReport> {
    let (cache, database) = tokio::join!(
        probe::run(state.cache.as_ref()),
        probe::run(state.database.as_ref()),
    );

    let mut errors = BTreeMap::new();
    if state.config.report.verbose_errors {
        if let Some(e) = &cache.error {
            errors.insert(CACHE_KEY, e.to_string());
        }
        if let Some(e) = &database.error {
            errors.insert(DATABASE_KEY, e.to_string());
        }
    }

    tracing::info!(
        cache = %cache.status,
        database = %database.status,
        "Health report"
    );

    Json(HealthReport {
        node_name: state.config.node.name.clone(),
        cache_status: cache.status,
        database_status: database.status,
        errors,
    })
}
