//! Configuration loading and constants.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file, then
//! environment variables. The result is validated once at startup and never
//! mutated afterwards. `AppConfig` is the root configuration struct.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Probe Constants
// =============================================================================

/// Key written and read back by the cache probe
pub const CACHE_PROBE_KEY: &str = "test";

/// Value stored under [`CACHE_PROBE_KEY`]
pub const CACHE_PROBE_VALUE: &str = "value";

/// Default timeout for a single probe, in seconds
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Cache-Control value for the health route (verdicts must never be cached)
pub const CACHE_CONTROL_HEALTH: &str = "no-store";

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "nodeprobe=debug,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Default database driver identifier
pub const DEFAULT_DATABASE_DRIVER: &str = "mysql";

// =============================================================================
// Environment Variables
// =============================================================================

pub const ENV_NODE_NAME: &str = "NODE_NAME";
pub const ENV_REDIS_HOST: &str = "REDIS_HOST";
pub const ENV_REDIS_PORT: &str = "REDIS_PORT";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DATABASE_USERNAME: &str = "DATABASE_USERNAME";
pub const ENV_DATABASE_PASSWORD: &str = "DATABASE_PASSWORD";
pub const ENV_DATABASE_DRIVER: &str = "DATABASE_DRIVER";
pub const ENV_HTTP_HOST: &str = "HTTP_HOST";
pub const ENV_HTTP_PORT: &str = "HTTP_PORT";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Identity of this process instance
    #[serde(default)]
    pub node: NodeConfig,
    /// Key-value cache probed on each request
    #[serde(default)]
    pub cache: CacheConfig,
    /// Relational database probed on each request
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Health report options
    #[serde(default)]
    pub report: ReportConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// File the configuration was read from; `None` when running on defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeConfig {
    /// Operator-supplied label echoed verbatim in every report
    #[serde(default)]
    pub name: String,
}

/// Key-value cache connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_host")]
    pub host: String,
    #[serde(default = "CacheConfig::default_port")]
    pub port: u16,
    /// Upper bound on the whole probe (connect, write, read), in seconds
    #[serde(default = "default_probe_timeout")]
    pub timeout_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            timeout_seconds: default_probe_timeout(),
        }
    }
}

impl CacheConfig {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        6379
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Relational database connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL; a leading `jdbc:` is accepted and ignored
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    /// Inline password. Takes precedence over `password_file`.
    pub password: Option<String>,
    /// File whose trimmed contents are used as the password
    pub password_file: Option<PathBuf>,
    /// Client driver identifier (e.g. "mysql", "com.mysql.cj.jdbc.Driver")
    #[serde(default = "DatabaseConfig::default_driver")]
    pub driver: String,
    /// Create the `test` database and `test.user` table before probing.
    /// Disable where the probing principal lacks DDL privileges.
    #[serde(default = "DatabaseConfig::default_ensure_schema")]
    pub ensure_schema: bool,
    #[serde(default = "default_probe_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: None,
            password_file: None,
            driver: Self::default_driver(),
            ensure_schema: Self::default_ensure_schema(),
            timeout_seconds: default_probe_timeout(),
        }
    }
}

impl DatabaseConfig {
    fn default_driver() -> String {
        DEFAULT_DATABASE_DRIVER.to_string()
    }

    fn default_ensure_schema() -> bool {
        true
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Check if any password source is configured
    pub fn has_password(&self) -> bool {
        self.password.is_some() || self.password_file.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportConfig {
    /// Include failure reasons under an "Errors" key when a probe fails
    #[serde(default)]
    pub verbose_errors: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

fn default_probe_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECS
}

impl AppConfig {
    /// Load configuration from `path` and the process environment.
    ///
    /// A missing file is tolerated only when `required` is false, so the
    /// service can run purely from environment variables.
    pub fn load<P: AsRef<Path>>(path: P, required: bool) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path.as_ref(), required)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let mut config: AppConfig = toml::from_str(&contents)?;
                config.source = Some(path.to_path_buf());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Override fields from environment-style key lookups.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_NODE_NAME) {
            self.node.name = v;
        }
        if let Some(v) = lookup(ENV_REDIS_HOST) {
            self.cache.host = v;
        }
        if let Some(v) = lookup(ENV_REDIS_PORT) {
            self.cache.port = parse_port(ENV_REDIS_PORT, &v)?;
        }
        if let Some(v) = lookup(ENV_DATABASE_URL) {
            self.database.url = v;
        }
        if let Some(v) = lookup(ENV_DATABASE_USERNAME) {
            self.database.username = v;
        }
        if let Some(v) = lookup(ENV_DATABASE_PASSWORD) {
            self.database.password = Some(v);
        }
        if let Some(v) = lookup(ENV_DATABASE_DRIVER) {
            self.database.driver = v;
        }
        if let Some(v) = lookup(ENV_HTTP_HOST) {
            self.http.host = v;
        }
        if let Some(v) = lookup(ENV_HTTP_PORT) {
            self.http.port = parse_port(ENV_HTTP_PORT, &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "node.name is empty. Set it in the config file or via {}",
                ENV_NODE_NAME
            )));
        }
        if self.cache.host.trim().is_empty() {
            return Err(ConfigError::Validation("cache.host is empty".to_string()));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "database.url is empty. Set it in the config file or via {}",
                ENV_DATABASE_URL
            )));
        }
        if self.cache.timeout_seconds == 0 || self.database.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "probe timeouts must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{} is not a valid port: {:?}", key, value)))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
