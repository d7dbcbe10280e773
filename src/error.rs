use std::io;
use std::time::Duration;

/// Reasons a probe can fail.
///
/// None of these reach the HTTP layer: the handler collapses every variant to
/// a `failed` status and only surfaces the message in verbose mode.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unsupported database driver: {0}")]
    UnsupportedDriver(String),

    #[error("Failed to read password file: {0}")]
    PasswordFile(#[from] io::Error),

    #[error("Read back {actual:?}, expected {expected:?}")]
    Mismatch {
        expected: String,
        actual: Option<String>,
    },

    #[error("Expected exactly 1 row, found {0}")]
    RowCount(i64),
}
