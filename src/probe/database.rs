//! Relational database probe.
//!
//! Opens a single connection, optionally ensures the probe schema exists, then
//! upserts a fixed row and counts the table. Because the upsert always targets
//! `id = 1`, the table converges to exactly one row however often the probe
//! runs, as long as nothing else writes to `test.user`.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};

use crate::config::DatabaseConfig;
use crate::error::ProbeError;

use super::Probe;

const CREATE_DATABASE: &str = "CREATE DATABASE IF NOT EXISTS test";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS test.user (\
    id INT(10) UNSIGNED NOT NULL AUTO_INCREMENT, \
    name VARCHAR(64) NOT NULL DEFAULT '', \
    PRIMARY KEY (id))";

const UPSERT_ROW: &str = "REPLACE INTO test.user (id, name) VALUES (1, 'test')";

const COUNT_ROWS: &str = "SELECT COUNT(*) FROM test.user";

/// Prefix carried by JDBC-style connection URLs
const JDBC_PREFIX: &str = "jdbc:";

/// Client drivers that speak the MySQL wire protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseDriver {
    MySql,
    MariaDb,
}

impl FromStr for DatabaseDriver {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "com.mysql.jdbc.driver" | "com.mysql.cj.jdbc.driver" => Ok(Self::MySql),
            "mariadb" | "org.mariadb.jdbc.driver" => Ok(Self::MariaDb),
            _ => Err(ProbeError::UnsupportedDriver(s.to_string())),
        }
    }
}

/// Strip a leading `jdbc:` so JDBC-style URLs can be reused as-is.
fn normalize_url(url: &str) -> &str {
    let url = url.trim();
    match url.get(..JDBC_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(JDBC_PREFIX) => &url[JDBC_PREFIX.len()..],
        _ => url,
    }
}

#[derive(Debug, Clone)]
pub struct MySqlProbe {
    config: DatabaseConfig,
}

impl MySqlProbe {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Resolve the password from inline config or `password_file`.
    ///
    /// Read on every probe so a rotated secret file is picked up without a restart.
    fn password(&self) -> Result<Option<String>, ProbeError> {
        if let Some(password) = &self.config.password {
            return Ok(Some(password.clone()));
        }
        match &self.config.password_file {
            Some(path) => Ok(Some(std::fs::read_to_string(path)?.trim_end().to_string())),
            None => Ok(None),
        }
    }

    fn connect_options(&self) -> Result<MySqlConnectOptions, ProbeError> {
        let driver: DatabaseDriver = self.config.driver.parse()?;
        tracing::trace!(?driver, "Resolved database driver");

        let mut options = MySqlConnectOptions::from_str(normalize_url(&self.config.url))?;
        if !self.config.username.is_empty() {
            options = options.username(&self.config.username);
        }
        if let Some(password) = self.password()? {
            options = options.password(&password);
        }
        Ok(options)
    }

    async fn exercise(&self, conn: &mut MySqlConnection) -> Result<(), ProbeError> {
        for statement in statements(self.config.ensure_schema) {
            (&mut *conn).execute(statement).await?;
        }

        let count: i64 = sqlx::query_scalar(COUNT_ROWS)
            .fetch_one(&mut *conn)
            .await?;

        verify_row_count(count)
    }
}

/// Statements run before the row count, in order.
///
/// The schema statements come first and are left out when `ensure_schema` is off.
fn statements(ensure_schema: bool) -> impl Iterator<Item = &'static str> {
    let schema: &'static [&'static str] = if ensure_schema {
        &[CREATE_DATABASE, CREATE_TABLE]
    } else {
        &[]
    };
    schema.iter().copied().chain(std::iter::once(UPSERT_ROW))
}

fn verify_row_count(count: i64) -> Result<(), ProbeError> {
    if count == 1 {
        Ok(())
    } else {
        Err(ProbeError::RowCount(count))
    }
}

#[async_trait]
impl Probe for MySqlProbe {
    fn name(&self) -> &'static str {
        "database"
    }

    fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    async fn check(&self) -> Result<(), ProbeError> {
        let options = self.connect_options()?;
        let mut conn = MySqlConnection::connect_with(&options).await?;

        let result = self.exercise(&mut conn).await;

        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "Failed to close probe connection cleanly");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{run, ProbeStatus};
    use std::io::Write;

    fn config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            username: "admin".to_string(),
            timeout_seconds: 2,
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn test_driver_identifiers() {
        assert_eq!("mysql".parse::<DatabaseDriver>().unwrap(), DatabaseDriver::MySql);
        assert_eq!(
            "com.mysql.cj.jdbc.Driver".parse::<DatabaseDriver>().unwrap(),
            DatabaseDriver::MySql
        );
        assert_eq!(
            "com.mysql.jdbc.Driver".parse::<DatabaseDriver>().unwrap(),
            DatabaseDriver::MySql
        );
        assert_eq!(
            "org.mariadb.jdbc.Driver".parse::<DatabaseDriver>().unwrap(),
            DatabaseDriver::MariaDb
        );
    }

    #[test]
    fn test_unknown_driver() {
        let err = "org.postgresql.Driver".parse::<DatabaseDriver>().unwrap_err();
        assert!(matches!(err, ProbeError::UnsupportedDriver(_)));
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("jdbc:mysql://db.internal:3306/"),
            "mysql://db.internal:3306/"
        );
        assert_eq!(normalize_url("JDBC:mysql://db:3306"), "mysql://db:3306");
        assert_eq!(normalize_url(" mysql://db:3306 "), "mysql://db:3306");
    }

    #[test]
    fn test_statements_with_schema() {
        let sequence: Vec<&str> = statements(true).collect();
        assert_eq!(sequence, vec![CREATE_DATABASE, CREATE_TABLE, UPSERT_ROW]);
        assert!(sequence[0].starts_with("CREATE DATABASE IF NOT EXISTS test"));
        assert!(sequence[1].starts_with("CREATE TABLE IF NOT EXISTS test.user"));
        assert!(sequence[1].contains("id INT(10) UNSIGNED NOT NULL AUTO_INCREMENT"));
        assert!(sequence[1].contains("name VARCHAR(64) NOT NULL DEFAULT ''"));
        assert!(sequence[1].contains("PRIMARY KEY (id)"));
    }

    #[test]
    fn test_statements_without_schema() {
        let sequence: Vec<&str> = statements(false).collect();
        assert_eq!(sequence, vec![UPSERT_ROW]);
        assert!(sequence.iter().all(|s| !s.starts_with("CREATE")));
    }

    #[test]
    fn test_upsert_and_count_target_fixed_row() {
        assert_eq!(
            UPSERT_ROW,
            "REPLACE INTO test.user (id, name) VALUES (1, 'test')"
        );
        assert_eq!(COUNT_ROWS, "SELECT COUNT(*) FROM test.user");
    }

    #[test]
    fn test_verify_row_count() {
        assert!(verify_row_count(1).is_ok());
        assert!(matches!(verify_row_count(0), Err(ProbeError::RowCount(0))));
        assert!(matches!(verify_row_count(2), Err(ProbeError::RowCount(2))));
    }

    #[test]
    fn test_password_absent() {
        let probe = MySqlProbe::new(&config("mysql://db:3306"));
        assert_eq!(probe.password().unwrap(), None);
    }

    #[test]
    fn test_password_inline_wins_over_file() {
        let mut cfg = config("mysql://db:3306");
        cfg.password = Some("inline".to_string());
        cfg.password_file = Some("/nonexistent/secret".into());
        let probe = MySqlProbe::new(&cfg);
        assert_eq!(probe.password().unwrap().as_deref(), Some("inline"));
    }

    #[test]
    fn test_password_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "s3cret").unwrap();
        let mut cfg = config("mysql://db:3306");
        cfg.password_file = Some(file.path().to_path_buf());
        let probe = MySqlProbe::new(&cfg);
        assert_eq!(probe.password().unwrap().as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_password_file_missing() {
        let mut cfg = config("mysql://db:3306");
        cfg.password_file = Some("/nonexistent/secret".into());
        let probe = MySqlProbe::new(&cfg);
        assert!(matches!(probe.password(), Err(ProbeError::PasswordFile(_))));
    }

    #[test]
    fn test_connect_options_accepts_jdbc_url() {
        let probe = MySqlProbe::new(&config("jdbc:mysql://db.internal:3306/"));
        assert!(probe.connect_options().is_ok());
    }

    #[test]
    fn test_connect_options_rejects_bad_driver() {
        let mut cfg = config("mysql://db:3306");
        cfg.driver = "oracle.jdbc.OracleDriver".to_string();
        let probe = MySqlProbe::new(&cfg);
        assert!(matches!(
            probe.connect_options(),
            Err(ProbeError::UnsupportedDriver(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_url_fails() {
        let outcome = run(&MySqlProbe::new(&config("not a url"))).await;
        assert_eq!(outcome.status, ProbeStatus::Failed);
    }

    #[tokio::test]
    async fn test_unreachable_database_fails() {
        // Nothing listens on port 1
        let outcome = run(&MySqlProbe::new(&config("mysql://127.0.0.1:1/"))).await;
        assert_eq!(outcome.status, ProbeStatus::Failed);
        assert!(outcome.error.is_some());
    }
}
