//! Cluster connection configuration.

use crate::{Result, error::GlobalsError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default port of a Greenplum coordinator.
pub const DEFAULT_PORT: u16 = 5432;

/// Configuration for the coordinator connection.
///
/// # Security
/// This struct intentionally does NOT store passwords. The password stays in
/// the connection URL handed to the driver and never reaches logs.
///
/// # Example
/// ```rust
/// use gpglobals_core::config::ConnectionConfig;
///
/// let config = ConnectionConfig::new("mdw".to_string())
///     .with_port(5432)
///     .with_database("prod".to_string())
///     .with_username("gpadmin".to_string());
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Coordinator host address
    pub host: String,
    /// Optional port number
    pub port: Option<u16>,
    /// Optional database name; the server default applies when absent
    pub database: Option<String>,
    /// Optional username (password handled separately)
    pub username: Option<String>,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Statement timeout applied to every catalog query
    pub query_timeout: Duration,
    /// Whether to enforce read-only transactions
    pub read_only: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            database: None,
            username: None,
            connect_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(300),
            read_only: true,
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ConnectionConfig({}{}{})",
            self.host,
            self.port.map_or_else(String::new, |p| format!(":{}", p)),
            self.database
                .as_ref()
                .map_or_else(String::new, |db| format!("/{}", db))
        )
        // Intentionally omit username and never include credentials
    }
}

impl ConnectionConfig {
    /// Creates a new connection config with safe defaults.
    pub fn new(host: String) -> Self {
        Self {
            host,
            ..Default::default()
        }
    }

    /// Builder method to set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder method to set database.
    pub fn with_database(mut self, database: String) -> Self {
        self.database = Some(database);
        self
    }

    /// Builder method to set username.
    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns error if configuration values are invalid
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(GlobalsError::configuration("host cannot be empty"));
        }

        if self.port == Some(0) {
            return Err(GlobalsError::configuration("port must be greater than 0"));
        }

        if self.database.as_deref() == Some("") {
            return Err(GlobalsError::configuration("database name cannot be empty"));
        }

        if self.connect_timeout.is_zero() {
            return Err(GlobalsError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        if self.query_timeout.is_zero() {
            return Err(GlobalsError::configuration(
                "query_timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Parses a `postgres://` or `postgresql://` URL into a configuration.
    ///
    /// Recognized query parameters: `connect_timeout` (seconds) and
    /// `statement_timeout` (milliseconds). Others are left for the driver.
    ///
    /// # Errors
    /// Returns error if the URL is malformed, uses another scheme, or yields
    /// an invalid configuration. Error text never contains the password.
    pub fn from_url(connection_string: &str) -> Result<Self> {
        let url = Url::parse(connection_string).map_err(|e| {
            GlobalsError::configuration(format!("Invalid connection string format: {}", e))
        })?;

        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(GlobalsError::configuration(
                "Connection string must use postgres:// or postgresql:// scheme",
            ));
        }

        let host = url
            .host_str()
            .ok_or_else(|| GlobalsError::configuration("Connection string must specify a host"))?;

        let mut config = Self::new(host.to_string()).with_port(url.port().unwrap_or(DEFAULT_PORT));

        let database = url.path().trim_start_matches('/');
        if !database.is_empty() {
            config = config.with_database(database.to_string());
        }

        if !url.username().is_empty() {
            config = config.with_username(url.username().to_string());
        }

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "connect_timeout" => {
                    if let Ok(timeout_secs) = value.parse::<u64>()
                        && timeout_secs > 0
                    {
                        config.connect_timeout = Duration::from_secs(timeout_secs);
                    }
                }
                "statement_timeout" => {
                    if let Ok(timeout_ms) = value.parse::<u64>()
                        && timeout_ms > 0
                    {
                        config.query_timeout = Duration::from_millis(timeout_ms);
                    }
                }
                _ => {}
            }
        }

        config.validate()?;
        Ok(config)
    }
}
