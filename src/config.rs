//! Configuration loading
//!
//! Loads database connection configuration from environment variables,
//! optionally reading from a .env file first.

use std::time::Duration;
use std::{env, path::Path};

use tracing::{debug, error, trace, warn};

use crate::error::EtoomapError;
use crate::introspect::Dialect;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 10;

/// Database connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
}

impl ConnectionOptions {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            user: user.into(),
            password: password.into(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables
    ///
    /// Expected variables:
    /// - DB_HOST (default: localhost)
    /// - DB_PORT (default: the dialect's standard port)
    /// - DB_NAME (required)
    /// - DB_USER (required)
    /// - DB_PASSWORD (required)
    /// - DB_CONNECT_TIMEOUT_SECS (default: 30)
    /// - DB_QUERY_TIMEOUT_SECS (default: 10)
    pub fn from_env(dialect: Dialect) -> Result<Self, EtoomapError> {
        debug!(dialect = %dialect, "Loading database configuration from environment");

        let host = env::var("DB_HOST").unwrap_or_else(|_| {
            trace!("DB_HOST not set, using default");
            "localhost".to_string()
        });

        let port = match env::var("DB_PORT") {
            Ok(port_str) => port_str.parse::<u16>().map_err(|e| {
                error!(port = ?port_str, error = ?e, "Invalid DB_PORT value");
                EtoomapError::Config("DB_PORT must be a valid port number".to_string())
            })?,
            Err(_) => {
                trace!("DB_PORT not set, using default");
                dialect.default_port()
            }
        };

        let database = required_var("DB_NAME")?;
        let user = required_var("DB_USER")?;
        let password = required_var("DB_PASSWORD")?;

        let connect_timeout = timeout_var("DB_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?;
        let query_timeout = timeout_var("DB_QUERY_TIMEOUT_SECS", DEFAULT_QUERY_TIMEOUT_SECS)?;

        debug!(host = ?host, port = ?port, database = ?database, user = ?user, "Configuration loaded");

        Ok(Self {
            host,
            port,
            database,
            user,
            password,
            connect_timeout,
            query_timeout,
        })
    }

    /// Load a .env file and then read configuration from environment
    pub fn load(env_file: &Path, dialect: Dialect) -> Result<Self, EtoomapError> {
        if env_file.exists() {
            debug!(path = ?env_file, "Loading environment file");
            dotenvy::from_path(env_file).map_err(|e| {
                error!(path = ?env_file, error = ?e, "Failed to load environment file");
                EtoomapError::Config(format!("Failed to load {}: {}", env_file.display(), e))
            })?;
        } else {
            warn!(path = ?env_file, "Environment file not found, using existing environment");
        }

        Self::from_env(dialect)
    }

    /// Schema used when none is given: `public` on Postgres, the connected
    /// database on MySQL, where schema and database are the same thing
    pub fn default_schema(&self, dialect: Dialect) -> &str {
        match dialect {
            Dialect::Postgres => "public",
            Dialect::Mysql => &self.database,
        }
    }

    /// Build a connection string with password redacted (for log messages)
    pub fn redacted_connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password=***",
            self.host, self.port, self.database, self.user
        )
    }
}

fn required_var(name: &str) -> Result<String, EtoomapError> {
    env::var(name).map_err(|_| {
        error!("{} environment variable is not set", name);
        EtoomapError::Config(format!("{} environment variable is required", name))
    })
}

fn timeout_var(name: &str, default_secs: u64) -> Result<Duration, EtoomapError> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map(Duration::from_secs).map_err(|e| {
            error!(variable = ?name, value = ?value, error = ?e, "Invalid timeout value");
            EtoomapError::Config(format!("{} must be a whole number of seconds", name))
        }),
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}
