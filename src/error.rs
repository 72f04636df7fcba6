use std::path::PathBuf;

use thiserror::Error;

/// etoomap errors
#[derive(Error, Debug)]
pub enum EtoomapError {
    /// A metadata query returned no rows
    #[error("{0}")]
    NotFound(String),

    /// A catalog row is missing a column the query selects; `target` names
    /// what was being read, e.g. `schema 'public'` or `the schema list`
    #[error("Failed to introspect {target}: {message}")]
    Introspection { target: String, message: String },

    #[error("Template '{name}' not found in {}", directory.display())]
    TemplateNotFound { name: String, directory: PathBuf },

    #[error("Unsupported target language: {0}")]
    UnsupportedLanguage(String),

    #[error("Unsupported data source type: {0}")]
    UnsupportedDataSource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid template manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to build template payload: {0}")]
    Payload(#[source] serde_json::Error),

    #[error(transparent)]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] postgres::Error),

    #[cfg(feature = "mysql")]
    #[error(transparent)]
    Mysql(#[from] mysql::Error),
}
