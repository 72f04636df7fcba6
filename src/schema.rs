//! Table metadata
//!
//! These types form the contract between introspection (produces) and
//! template rendering (consumes). They serialize with the camelCase keys that
//! templates refer to (`tableName`, `camelCaseName`, `isPrimaryKey`, ...).

use serde::Serialize;

use crate::codegen::types::{resolve_type, TargetLanguage};
use crate::error::EtoomapError;
use crate::naming::{to_camel_case, to_pascal_case};

/// A table column
///
/// The camelCase and PascalCase names are derived from `name` and recomputed
/// every time the name changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    name: String,
    camel_case_name: String,
    pascal_case_name: String,
    default_value: Option<String>,
    #[serde(rename = "type")]
    data_type: String,
    is_primary_key: bool,
}

impl ColumnInfo {
    pub fn new(
        name: impl Into<String>,
        default_value: Option<String>,
        data_type: impl Into<String>,
        is_primary_key: bool,
    ) -> Self {
        let name = name.into();
        Self {
            camel_case_name: to_camel_case(&name),
            pascal_case_name: to_pascal_case(&name),
            name,
            default_value,
            data_type: data_type.into(),
            is_primary_key,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.camel_case_name = to_camel_case(&self.name);
        self.pascal_case_name = to_pascal_case(&self.name);
    }

    pub fn camel_case_name(&self) -> &str {
        &self.camel_case_name
    }

    pub fn pascal_case_name(&self) -> &str {
        &self.pascal_case_name
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// Vendor type code, or the target-language type after remapping
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.is_primary_key
    }
}

/// Database table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub schema: String,
    /// Always PascalCase
    table_name: String,
    /// Columns in the order the catalog returned them
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    /// Build table metadata; `table_name` is the raw catalog name
    pub fn new(schema: impl Into<String>, table_name: &str, columns: Vec<ColumnInfo>) -> Self {
        Self {
            schema: schema.into(),
            table_name: to_pascal_case(table_name),
            columns,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Get primary key columns in order
    pub fn primary_key_columns(&self) -> Vec<&ColumnInfo> {
        self.columns.iter().filter(|col| col.is_primary_key).collect()
    }

    /// Copy of this table with every column type mapped to `language`
    pub fn with_resolved_types(&self, language: TargetLanguage) -> TableInfo {
        let columns = self
            .columns
            .iter()
            .map(|col| ColumnInfo {
                data_type: resolve_type(&col.data_type, language).to_string(),
                ..col.clone()
            })
            .collect();

        TableInfo {
            schema: self.schema.clone(),
            table_name: self.table_name.clone(),
            columns,
        }
    }

    /// Same as [`TableInfo::with_resolved_types`] for a language given by name
    pub fn with_types_for(&self, language: &str) -> Result<TableInfo, EtoomapError> {
        let language = language.parse::<TargetLanguage>()?;
        Ok(self.with_resolved_types(language))
    }
}
