use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Params, Row, Value};
use tracing::{error, info, trace};

use super::{CatalogConnection, CatalogRow};
use crate::config::ConnectionOptions;
use crate::error::EtoomapError;

/// MySQL catalog connection
pub struct MysqlConnection {
    conn: Conn,
}

impl MysqlConnection {
    /// Connect with the configured connect timeout; the query timeout bounds
    /// socket reads and writes
    pub fn connect(options: &ConnectionOptions) -> Result<Self, EtoomapError> {
        info!(connection = ?options.redacted_connection_string(), "Connecting to MySQL");

        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(options.host.clone()))
            .tcp_port(options.port)
            .db_name(Some(options.database.clone()))
            .user(Some(options.user.clone()))
            .pass(Some(options.password.clone()))
            .tcp_connect_timeout(Some(options.connect_timeout))
            .read_timeout(Some(options.query_timeout))
            .write_timeout(Some(options.query_timeout));

        let conn = Conn::new(opts).map_err(|e| {
            error!(
                connection = ?options.redacted_connection_string(),
                error = ?e,
                "Failed to connect to MySQL"
            );
            e
        })?;

        info!("Connected to database");
        Ok(Self { conn })
    }
}

impl CatalogConnection for MysqlConnection {
    fn fetch(&mut self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>, EtoomapError> {
        trace!(params = ?params, "Running catalog query");

        let params = if params.is_empty() {
            Params::Empty
        } else {
            Params::Positional(params.iter().map(|p| Value::from(*p)).collect())
        };

        let rows: Vec<Row> = self.conn.exec(sql, params).map_err(|e| {
            error!(error = ?e, "Catalog query failed");
            e
        })?;

        Ok(rows.iter().map(to_catalog_row).collect())
    }

    fn close(self) -> Result<(), EtoomapError> {
        // Dropping the connection sends COM_QUIT
        drop(self.conn);
        Ok(())
    }
}

fn to_catalog_row(row: &Row) -> CatalogRow {
    let mut catalog_row = CatalogRow::new();
    for (idx, column) in row.columns_ref().iter().enumerate() {
        let value = row.as_ref(idx).and_then(value_to_text);
        catalog_row.insert(column.name_str().into_owned(), value);
    }
    catalog_row
}

/// Text form of a result value; the binary protocol reports integers natively
fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::Int(i) => Some(i.to_string()),
        Value::UInt(u) => Some(u.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Double(d) => Some(d.to_string()),
        other => Some(other.as_sql(true).trim_matches('\'').to_string()),
    }
}
