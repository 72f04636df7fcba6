use postgres::types::ToSql;
use postgres::{Client, Config, NoTls, Row};
use tracing::{error, info, trace};

use super::{CatalogConnection, CatalogRow};
use crate::config::ConnectionOptions;
use crate::error::EtoomapError;

/// PostgreSQL catalog connection
///
/// Every catalog query casts its result columns to `text`, so rows are read
/// as optional strings throughout.
pub struct PostgresConnection {
    client: Client,
}

impl PostgresConnection {
    /// Connect with the configured connect timeout; the query timeout is
    /// applied as the session's `statement_timeout`
    pub fn connect(options: &ConnectionOptions) -> Result<Self, EtoomapError> {
        info!(connection = ?options.redacted_connection_string(), "Connecting to PostgreSQL");

        let client = Config::new()
            .host(&options.host)
            .port(options.port)
            .dbname(&options.database)
            .user(&options.user)
            .password(&options.password)
            .connect_timeout(options.connect_timeout)
            .options(&format!(
                "-c statement_timeout={}",
                options.query_timeout.as_millis()
            ))
            .connect(NoTls)
            .map_err(|e| {
                error!(
                    connection = ?options.redacted_connection_string(),
                    error = ?e,
                    "Failed to connect to PostgreSQL"
                );
                e
            })?;

        info!("Connected to database");
        Ok(Self { client })
    }
}

impl CatalogConnection for PostgresConnection {
    fn fetch(&mut self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>, EtoomapError> {
        trace!(params = ?params, "Running catalog query");

        let params: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let rows = self.client.query(sql, &params).map_err(|e| {
            error!(error = ?e, "Catalog query failed");
            e
        })?;

        rows.iter().map(to_catalog_row).collect()
    }

    fn close(self) -> Result<(), EtoomapError> {
        self.client.close()?;
        Ok(())
    }
}

fn to_catalog_row(row: &Row) -> Result<CatalogRow, EtoomapError> {
    let mut catalog_row = CatalogRow::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value: Option<String> = row.try_get(idx)?;
        catalog_row.insert(column.name(), value);
    }
    Ok(catalog_row)
}
