//! # etoomap
//!
//! Entity to object mapper
//!
//! This crate provides a CLI tool and library for introspecting a database
//! table and rendering its metadata through a template, e.g. into an entity
//! class.

pub mod codegen;
pub mod config;
pub mod error;
pub mod introspect;
pub mod naming;
pub mod reverser;
pub mod schema;

pub mod prelude {
    pub use crate::codegen::{
        generate, generate_and_export, list_template_dirs, list_templates, CodeGenConfig, Extras,
        TargetLanguage, Template, TemplateEntry, TemplateRef, TemplateSet, BUNDLED_SET,
    };
    pub use crate::config::ConnectionOptions;
    pub use crate::error::EtoomapError;
    pub use crate::introspect::{CatalogConnection, Dialect, DriverConnection, Introspector};
    pub use crate::reverser::DataSourceReverser;
    pub use crate::schema::{ColumnInfo, TableInfo};
}

#[cfg(feature = "postgres")]
pub use introspect::PostgresConnection;

#[cfg(feature = "mysql")]
pub use introspect::MysqlConnection;
