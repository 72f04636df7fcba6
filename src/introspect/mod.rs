//! Database introspection
//!
//! This module provides functionality for extracting table metadata from
//! databases. The catalog queries and result-key casing of every supported
//! dialect live on [`Dialect`]; drivers only have to implement
//! [`CatalogConnection`]. Each driver is a feature-gated submodule.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, info, trace};

use crate::config::ConnectionOptions;
use crate::error::EtoomapError;
use crate::schema::{ColumnInfo, TableInfo};

/// Supported database dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Mysql,
}

impl FromStr for Dialect {
    type Err = EtoomapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::Mysql),
            _ => Err(EtoomapError::UnsupportedDataSource(s.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => f.write_str("postgres"),
            Dialect::Mysql => f.write_str("mysql"),
        }
    }
}

const POSTGRES_SCHEMA_LIST: &str = r#"
    SELECT T.SCHEMA_NAME::text AS SCHEMA_NAME
    FROM INFORMATION_SCHEMA.SCHEMATA T
    ORDER BY 1
"#;

const POSTGRES_TABLE_LIST: &str = r#"
    SELECT T.TABLE_NAME::text AS TABLE_NAME
    FROM INFORMATION_SCHEMA.TABLES T
    WHERE T.TABLE_SCHEMA::text = $1
    ORDER BY 1
"#;

const POSTGRES_TABLE_INFO: &str = r#"
    SELECT COLS.COLUMN_NAME::text AS COLUMN_NAME,
        COLS.COLUMN_DEFAULT::text AS COLUMN_DEFAULT,
        COLS.DATA_TYPE::text AS DATA_TYPE,
        COALESCE((
            SELECT 1
            FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS TC
            JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE KC
                ON KC.CONSTRAINT_SCHEMA = TC.CONSTRAINT_SCHEMA
                AND KC.CONSTRAINT_NAME = TC.CONSTRAINT_NAME
                AND KC.TABLE_NAME = TC.TABLE_NAME
            WHERE TC.CONSTRAINT_TYPE = 'PRIMARY KEY'
                AND KC.TABLE_SCHEMA = COLS.TABLE_SCHEMA
                AND KC.TABLE_NAME = COLS.TABLE_NAME
                AND KC.COLUMN_NAME = COLS.COLUMN_NAME
            LIMIT 1
        ), 0)::text AS IS_PRIMARY_KEY
    FROM INFORMATION_SCHEMA.COLUMNS COLS
    WHERE COLS.TABLE_SCHEMA::text = $1
        AND COLS.TABLE_NAME::text = $2
    ORDER BY COLS.ORDINAL_POSITION
"#;

const MYSQL_SCHEMA_LIST: &str = r#"
    SELECT T.SCHEMA_NAME AS SCHEMA_NAME
    FROM INFORMATION_SCHEMA.SCHEMATA T
    ORDER BY 1
"#;

const MYSQL_TABLE_LIST: &str = r#"
    SELECT T.TABLE_NAME AS TABLE_NAME
    FROM INFORMATION_SCHEMA.TABLES T
    WHERE T.TABLE_SCHEMA = ?
    ORDER BY 1
"#;

const MYSQL_TABLE_INFO: &str = r#"
    SELECT COLS.COLUMN_NAME AS COLUMN_NAME,
        COLS.COLUMN_DEFAULT AS COLUMN_DEFAULT,
        COLS.DATA_TYPE AS DATA_TYPE,
        COALESCE((
            SELECT 1
            FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS TC
            JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE KC
                ON KC.CONSTRAINT_SCHEMA = TC.CONSTRAINT_SCHEMA
                AND KC.CONSTRAINT_NAME = TC.CONSTRAINT_NAME
                AND KC.TABLE_NAME = TC.TABLE_NAME
            WHERE TC.CONSTRAINT_TYPE = 'PRIMARY KEY'
                AND KC.TABLE_SCHEMA = COLS.TABLE_SCHEMA
                AND KC.TABLE_NAME = COLS.TABLE_NAME
                AND KC.COLUMN_NAME = COLS.COLUMN_NAME
            LIMIT 1
        ), 0) AS IS_PRIMARY_KEY
    FROM INFORMATION_SCHEMA.COLUMNS COLS
    WHERE COLS.TABLE_SCHEMA = ?
        AND COLS.TABLE_NAME = ?
    ORDER BY COLS.ORDINAL_POSITION
"#;

impl Dialect {
    pub fn default_port(self) -> u16 {
        match self {
            Dialect::Postgres => 5432,
            Dialect::Mysql => 3306,
        }
    }

    /// Lists every schema; no parameters
    pub fn schema_list_query(self) -> &'static str {
        match self {
            Dialect::Postgres => POSTGRES_SCHEMA_LIST,
            Dialect::Mysql => MYSQL_SCHEMA_LIST,
        }
    }

    /// Lists the tables of one schema; parameter: schema
    pub fn table_list_query(self) -> &'static str {
        match self {
            Dialect::Postgres => POSTGRES_TABLE_LIST,
            Dialect::Mysql => MYSQL_TABLE_LIST,
        }
    }

    /// Lists the columns of one table; parameters: schema, table
    pub fn table_info_query(self) -> &'static str {
        match self {
            Dialect::Postgres => POSTGRES_TABLE_INFO,
            Dialect::Mysql => MYSQL_TABLE_INFO,
        }
    }

    /// Result key for a query alias, in the casing the catalog reports it
    ///
    /// Postgres folds unquoted aliases to lower case; MySQL keeps them as
    /// written, and all queries here write them in upper case.
    pub fn result_key(self, alias: &str) -> String {
        match self {
            Dialect::Postgres => alias.to_lowercase(),
            Dialect::Mysql => alias.to_uppercase(),
        }
    }
}

/// One result row, column name to text value (`None` for SQL NULL)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    values: HashMap<String, Option<String>>,
}

impl CatalogRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Option<String>) {
        self.values.insert(column.into(), value);
    }

    /// Whether the row has a column with this exact name
    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Value of a column; `None` if the column is absent or NULL
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).and_then(|v| v.as_deref())
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for CatalogRow {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A live database connection able to run catalog queries
pub trait CatalogConnection {
    /// Run `sql` with positional text parameters and return every row
    fn fetch(&mut self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>, EtoomapError>;

    /// Release the connection
    fn close(self) -> Result<(), EtoomapError>
    where
        Self: Sized;
}

/// Trait for database introspection implementations
pub trait Introspector {
    /// Names of all schemas; fails with `NotFound` when there are none
    fn schema_list(&mut self) -> Result<Vec<String>, EtoomapError>;

    /// Names of the tables in `schema`; fails with `NotFound` when there are none
    fn table_list(&mut self, schema: &str) -> Result<Vec<String>, EtoomapError>;

    /// Metadata of one table; fails with `NotFound` when the table has no
    /// visible columns
    fn table_info(&mut self, schema: &str, table_name: &str) -> Result<TableInfo, EtoomapError>;
}

/// Introspector running a dialect's catalog queries over a connection
pub struct CatalogIntrospector<C> {
    conn: C,
    dialect: Dialect,
}

impl<C: CatalogConnection> CatalogIntrospector<C> {
    pub fn new(conn: C, dialect: Dialect) -> Self {
        Self { conn, dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Close the underlying connection
    pub fn close(self) -> Result<(), EtoomapError> {
        debug!(dialect = %self.dialect, "Closing connection");
        self.conn.close()
    }

    /// Read one text column of a result row; `target` names what the query
    /// describes in errors
    fn text(&self, row: &CatalogRow, alias: &str, target: &str) -> Result<Option<String>, EtoomapError> {
        let key = self.dialect.result_key(alias);
        if !row.contains(&key) {
            return Err(EtoomapError::Introspection {
                target: target.to_string(),
                message: format!("Catalog row has no column '{}'", key),
            });
        }
        Ok(row.get(&key).map(str::to_string))
    }

    fn required_text(&self, row: &CatalogRow, alias: &str, target: &str) -> Result<String, EtoomapError> {
        self.text(row, alias, target)?
            .ok_or_else(|| EtoomapError::Introspection {
                target: target.to_string(),
                message: format!("Catalog column '{}' is NULL", alias),
            })
    }
}

impl<C: CatalogConnection> Introspector for CatalogIntrospector<C> {
    fn schema_list(&mut self) -> Result<Vec<String>, EtoomapError> {
        trace!(dialect = %self.dialect, "Querying schemas");

        let rows = self.conn.fetch(self.dialect.schema_list_query(), &[])?;
        if rows.is_empty() {
            return Err(EtoomapError::NotFound("No schema found.".to_string()));
        }

        let schemas = rows
            .iter()
            .map(|row| self.required_text(row, "SCHEMA_NAME", "the schema list"))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = ?schemas.len(), "Found schemas");
        Ok(schemas)
    }

    fn table_list(&mut self, schema: &str) -> Result<Vec<String>, EtoomapError> {
        trace!(schema = ?schema, "Querying tables");

        let rows = self.conn.fetch(self.dialect.table_list_query(), &[schema])?;
        if rows.is_empty() {
            return Err(EtoomapError::NotFound(format!(
                "No table found in schema {}",
                schema
            )));
        }

        let target = format!("schema '{}'", schema);
        let tables = rows
            .iter()
            .map(|row| self.required_text(row, "TABLE_NAME", &target))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(schema = ?schema, count = ?tables.len(), "Found tables");
        Ok(tables)
    }

    fn table_info(&mut self, schema: &str, table_name: &str) -> Result<TableInfo, EtoomapError> {
        info!(schema = ?schema, table = ?table_name, "Introspecting table");

        let rows = self
            .conn
            .fetch(self.dialect.table_info_query(), &[schema, table_name])?;
        if rows.is_empty() {
            return Err(EtoomapError::NotFound(format!(
                "Table not found, {}.{}",
                schema, table_name
            )));
        }

        let target = format!("table {}.{}", schema, table_name);
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name = self.required_text(row, "COLUMN_NAME", &target)?;
            let default_value = self.text(row, "COLUMN_DEFAULT", &target)?;
            let data_type = self.required_text(row, "DATA_TYPE", &target)?;
            let is_primary_key = parse_flag(self.text(row, "IS_PRIMARY_KEY", &target)?.as_deref());

            trace!(
                column = ?name,
                data_type = ?data_type,
                default_value = ?default_value,
                is_primary_key = ?is_primary_key,
                "Parsed column"
            );

            columns.push(ColumnInfo::new(name, default_value, data_type, is_primary_key));
        }

        let table = TableInfo::new(schema, table_name, columns);
        debug!(
            table = ?table_name,
            columns = ?table.columns.len(),
            primary_keys = ?table.primary_key_columns().len(),
            "Table introspection complete"
        );
        Ok(table)
    }
}

/// Interpret a catalog boolean reported as `1`/`0`, `t`/`f` or `true`/`false`
fn parse_flag(value: Option<&str>) -> bool {
    match value {
        Some(v) => matches!(
            v.trim().to_lowercase().as_str(),
            "1" | "t" | "true" | "y" | "yes"
        ),
        None => false,
    }
}

// Feature-gated database implementations
#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use self::postgres::PostgresConnection;

#[cfg(feature = "mysql")]
mod mysql;

#[cfg(feature = "mysql")]
pub use self::mysql::MysqlConnection;

/// Connection to whichever driver a dialect selects
///
/// Drivers are compiled in through the `postgres` and `mysql` features;
/// asking for a dialect whose driver is missing fails at construction.
pub enum DriverConnection {
    #[cfg(feature = "postgres")]
    Postgres(PostgresConnection),
    #[cfg(feature = "mysql")]
    Mysql(MysqlConnection),
}

impl DriverConnection {
    #[cfg_attr(not(any(feature = "postgres", feature = "mysql")), allow(unused_variables))]
    pub fn connect(dialect: Dialect, options: &ConnectionOptions) -> Result<Self, EtoomapError> {
        match dialect {
            #[cfg(feature = "postgres")]
            Dialect::Postgres => Ok(Self::Postgres(PostgresConnection::connect(options)?)),
            #[cfg(feature = "mysql")]
            Dialect::Mysql => Ok(Self::Mysql(MysqlConnection::connect(options)?)),
            #[allow(unreachable_patterns)]
            other => {
                Err(EtoomapError::UnsupportedDataSource(format!(
                    "{} support not enabled, rebuild with --features {}",
                    other, other
                )))
            }
        }
    }
}

impl CatalogConnection for DriverConnection {
    #[cfg_attr(not(any(feature = "postgres", feature = "mysql")), allow(unused_variables))]
    fn fetch(&mut self, sql: &str, params: &[&str]) -> Result<Vec<CatalogRow>, EtoomapError> {
        match *self {
            #[cfg(feature = "postgres")]
            DriverConnection::Postgres(ref mut conn) => conn.fetch(sql, params),
            #[cfg(feature = "mysql")]
            DriverConnection::Mysql(ref mut conn) => conn.fetch(sql, params),
        }
    }

    fn close(self) -> Result<(), EtoomapError> {
        match self {
            #[cfg(feature = "postgres")]
            DriverConnection::Postgres(conn) => conn.close(),
            #[cfg(feature = "mysql")]
            DriverConnection::Mysql(conn) => conn.close(),
        }
    }
}
