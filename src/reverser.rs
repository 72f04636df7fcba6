//! One generation run over one database connection
//!
//! [`DataSourceReverser`] owns the connection for its whole lifetime and
//! exposes the operations a front-end needs: discovery, introspection and
//! generation. Call [`DataSourceReverser::close`] when done.

use std::path::PathBuf;

use tracing::debug;

use crate::codegen::{self, CodeGenConfig, Extras, TemplateRef};
use crate::config::ConnectionOptions;
use crate::error::EtoomapError;
use crate::introspect::{CatalogConnection, CatalogIntrospector, Dialect, DriverConnection, Introspector};
use crate::schema::TableInfo;

pub struct DataSourceReverser<C: CatalogConnection> {
    introspector: CatalogIntrospector<C>,
}

impl DataSourceReverser<DriverConnection> {
    /// Connect to the database with the driver of `dialect`
    pub fn connect(dialect: Dialect, options: &ConnectionOptions) -> Result<Self, EtoomapError> {
        let conn = DriverConnection::connect(dialect, options)?;
        Ok(Self::new(conn, dialect))
    }
}

impl<C: CatalogConnection> DataSourceReverser<C> {
    pub fn new(conn: C, dialect: Dialect) -> Self {
        Self {
            introspector: CatalogIntrospector::new(conn, dialect),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.introspector.dialect()
    }

    pub fn schema_list(&mut self) -> Result<Vec<String>, EtoomapError> {
        self.introspector.schema_list()
    }

    pub fn table_list(&mut self, schema: &str) -> Result<Vec<String>, EtoomapError> {
        self.introspector.table_list(schema)
    }

    pub fn table_info(&mut self, schema: &str, table_name: &str) -> Result<TableInfo, EtoomapError> {
        self.introspector.table_info(schema, table_name)
    }

    /// Introspect a table and render it through a template
    pub fn generate(
        &mut self,
        schema: &str,
        table_name: &str,
        reference: &TemplateRef,
        extras: &Extras,
    ) -> Result<String, EtoomapError> {
        let table = self.table_info(schema, table_name)?;
        codegen::generate(reference, &table, extras)
    }

    /// Introspect a table, render it and write the result to disk
    pub fn generate_and_export(
        &mut self,
        schema: &str,
        table_name: &str,
        reference: &TemplateRef,
        config: &CodeGenConfig,
    ) -> Result<PathBuf, EtoomapError> {
        let table = self.table_info(schema, table_name)?;
        codegen::generate_and_export(reference, &table, config)
    }

    /// Release the database connection
    pub fn close(self) -> Result<(), EtoomapError> {
        debug!("Closing data source");
        self.introspector.close()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::codegen::manifest::MANIFEST_FILE;
    use crate::introspect::testing::{pg_column, SharedFake};
    use tempfile::TempDir;

    fn template_set() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"templates": [{"name": "fields", "language": "java", "extension": "java",
                "inputType": "table", "templateFile": "fields.jinja"}]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("fields.jinja"),
            "package {{ packageName }};\n{% for c in columns %}\n{{ c.type }} {{ c.camelCaseName }};\n{% endfor %}\n",
        )
        .unwrap();
        dir
    }

    fn reverser() -> (DataSourceReverser<SharedFake>, SharedFake) {
        let conn = SharedFake::new(vec![vec![
            pg_column("customer_id", None, "integer", "1"),
            pg_column("email", None, "character varying", "0"),
        ]]);
        (DataSourceReverser::new(conn.clone(), Dialect::Postgres), conn)
    }

    #[test]
    fn test_generate_from_data_source() {
        let dir = template_set();
        let (mut reverser, _) = reverser();
        let reference = TemplateRef::Named {
            directory: dir.path().to_path_buf(),
            name: "fields".to_string(),
        };
        let mut extras = Extras::new();
        extras.insert("packageName".to_string(), "shop".into());

        let text = reverser
            .generate("public", "customer", &reference, &extras)
            .unwrap();
        assert_eq!(text, "package shop;\nint customerId;\nString email;\n");
    }

    #[test]
    fn test_generate_and_export_from_data_source() {
        let dir = template_set();
        let out = TempDir::new().unwrap();
        let (mut reverser, conn) = reverser();
        let reference = TemplateRef::Named {
            directory: dir.path().to_path_buf(),
            name: "fields".to_string(),
        };
        let config = CodeGenConfig::new(out.path().to_path_buf()).with_extra("packageName", "shop");

        let path = reverser
            .generate_and_export("public", "customer", &reference, &config)
            .unwrap();
        assert_eq!(path, out.path().join("Customer.java"));
        assert!(fs::read_to_string(&path).unwrap().starts_with("package shop;\n"));

        reverser.close().unwrap();
        assert!(conn.0.borrow().closed);
    }

    #[test]
    fn test_missing_table_fails_before_rendering() {
        let dir = template_set();
        let out = TempDir::new().unwrap();
        let mut reverser = DataSourceReverser::new(SharedFake::new(vec![]), Dialect::Mysql);
        let reference = TemplateRef::Named {
            directory: dir.path().to_path_buf(),
            name: "fields".to_string(),
        };

        let err = reverser
            .generate_and_export("shop", "ghost", &reference, &CodeGenConfig::new(out.path().to_path_buf()))
            .unwrap_err();
        assert!(matches!(err, EtoomapError::NotFound(_)));
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }
}
