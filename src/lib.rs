//! nodeprobe: a deployment smoke-test endpoint.
//!
//! Serves a single route that reports the configured node name together with a
//! live pass/fail verdict for a Redis cache and a MySQL-compatible database.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod probe;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use error::ProbeError;
pub use routes::create_router;
pub use state::AppState;
