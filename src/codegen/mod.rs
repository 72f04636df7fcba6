//! Code generation
//!
//! Renders introspected table metadata through a template and optionally
//! writes the result to disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::EtoomapError;
use crate::schema::TableInfo;

pub mod bundled;
pub mod manifest;
pub mod template;
pub mod types;

pub use bundled::{TemplateSet, BUNDLED_SET};
pub use manifest::{list_template_dirs, list_templates, Manifest, TemplateEntry};
pub use template::{Template, TemplateRef};
pub use types::{resolve_type, TargetLanguage};

/// Caller-supplied values merged into the template payload (e.g. `packageName`)
pub type Extras = Map<String, Value>;

/// Configuration for code generation
#[derive(Debug, Clone, Default)]
pub struct CodeGenConfig {
    /// Output directory for exported files
    pub output_path: PathBuf,
    /// Values merged over the table data
    pub extras: Extras,
}

impl CodeGenConfig {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            extras: Extras::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.extras.extend(extras);
        self
    }
}

/// Build the template payload: table data shallow-merged with `extras`
///
/// Column types are mapped to the template's language first. On a key
/// collision the extra value wins and the collision is logged.
pub fn build_payload(
    table: &TableInfo,
    template: &Template,
    extras: &Extras,
) -> Result<Value, EtoomapError> {
    let resolved = table.with_resolved_types(template.language());
    merge_extras(&resolved, extras)
}

/// Serialize `data` to a JSON object and insert `extras` over its keys
fn merge_extras<T: Serialize>(data: &T, extras: &Extras) -> Result<Value, EtoomapError> {
    let mut payload = match serde_json::to_value(data).map_err(EtoomapError::Payload)? {
        Value::Object(map) => map,
        other => {
            return Err(EtoomapError::Payload(serde::ser::Error::custom(format!(
                "expected an object, got {}",
                other
            ))))
        }
    };

    for (key, value) in extras {
        if payload.contains_key(key) {
            warn!(key = ?key, "Extra value overrides table data");
        }
        payload.insert(key.clone(), value.clone());
    }

    Ok(Value::Object(payload))
}

/// Render `table` through an already compiled template
pub fn render(template: &Template, table: &TableInfo, extras: &Extras) -> Result<String, EtoomapError> {
    debug!(
        template = ?template.name(),
        table = ?table.table_name(),
        columns = ?table.columns.len(),
        "Rendering template"
    );
    let payload = build_payload(table, template, extras)?;
    template.render(&payload)
}

/// Resolve a template and render `table` through it
pub fn generate(
    reference: &TemplateRef,
    table: &TableInfo,
    extras: &Extras,
) -> Result<String, EtoomapError> {
    let template = Template::load(reference)?;
    render(&template, table, extras)
}

/// Write rendered text to `{output_dir}/{file_name}.{extension}`
///
/// Creates the directory if needed and truncates an existing file. The write
/// is not atomic: a failure part way through can leave a truncated file.
pub fn export(
    output_dir: &Path,
    file_name: &str,
    extension: &str,
    body: &str,
) -> Result<PathBuf, EtoomapError> {
    fs::create_dir_all(output_dir)?;
    debug!(path = ?output_dir, "Ensured output directory");

    let path = output_dir.join(format!("{}.{}", file_name, extension));
    fs::write(&path, body)?;
    Ok(path)
}

/// Render `table` and export it as `{output_path}/{TableName}.{extension}`
pub fn generate_and_export(
    reference: &TemplateRef,
    table: &TableInfo,
    config: &CodeGenConfig,
) -> Result<PathBuf, EtoomapError> {
    let template = Template::load(reference)?;
    let body = render(&template, table, &config.extras)?;
    let path = export(
        &config.output_path,
        table.table_name(),
        template.extension(),
        &body,
    )?;

    info!(table = ?table.table_name(), path = ?path, "Generated file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnInfo;
    use tempfile::TempDir;

    fn table() -> TableInfo {
        TableInfo::new(
            "public",
            "film_actor",
            vec![
                ColumnInfo::new("actor_id", None, "smallint", true),
                ColumnInfo::new("film_id", None, "bigint", true),
            ],
        )
    }

    fn template(source: &str) -> Template {
        Template::from_source(
            "test".to_string(),
            source.to_string(),
            TargetLanguage::Java,
            "java".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_payload_has_resolved_types() {
        let payload = build_payload(&table(), &template(""), &Extras::new()).unwrap();
        assert_eq!(payload["tableName"], "FilmActor");
        assert_eq!(payload["columns"][0]["type"], "int");
        assert_eq!(payload["columns"][1]["type"], "long");
    }

    #[test]
    fn test_extras_are_merged() {
        let config = CodeGenConfig::default().with_extra("packageName", "io.example");
        let payload = build_payload(&table(), &template(""), &config.extras).unwrap();
        assert_eq!(payload["packageName"], "io.example");
        assert_eq!(payload["schema"], "public");
    }

    #[test]
    fn test_extras_win_on_collision() {
        let config = CodeGenConfig::default().with_extra("schema", "override");
        let payload = build_payload(&table(), &template(""), &config.extras).unwrap();
        assert_eq!(payload["schema"], "override");
    }

    #[test]
    fn test_payload_serialization_error_is_reported() {
        let mut data = std::collections::BTreeMap::new();
        data.insert((1, 2), "non-string key");

        let err = merge_extras(&data, &Extras::new()).unwrap_err();
        assert!(matches!(err, EtoomapError::Payload(_)));
    }

    #[test]
    fn test_payload_must_be_an_object() {
        let err = merge_extras(&vec!["actor_id"], &Extras::new()).unwrap_err();
        assert!(matches!(err, EtoomapError::Payload(_)));
        assert!(err.to_string().starts_with("Failed to build template payload"));
    }

    #[test]
    fn test_render_loops_over_columns() {
        let text = render(
            &template("{% for c in columns %}{{ c.type }} {{ c.camelCaseName }};{% endfor %}"),
            &table(),
            &Extras::new(),
        )
        .unwrap();
        assert_eq!(text, "int actorId;long filmId;");
    }

    #[test]
    fn test_generate_and_export_writes_rendered_text() {
        let dir = TempDir::new().unwrap();
        let template_path = dir.path().join("entity.jinja");
        fs::write(&template_path, "package {{ packageName }};\nclass {{ tableName }}\n").unwrap();

        let reference = TemplateRef::File {
            path: template_path,
            language: "java".to_string(),
            extension: "java".to_string(),
        };
        let config = CodeGenConfig::new(dir.path().join("out/nested")).with_extra("packageName", "pkg");

        let rendered = generate(&reference, &table(), &config.extras).unwrap();
        let path = generate_and_export(&reference, &table(), &config).unwrap();

        assert_eq!(path, dir.path().join("out/nested/FilmActor.java"));
        assert_eq!(fs::read_to_string(&path).unwrap(), rendered);
        assert_eq!(rendered, "package pkg;\nclass FilmActor\n");
    }

    #[test]
    fn test_export_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("Actor.java");
        fs::write(&existing, "a much longer previous body that should disappear").unwrap();

        let path = export(dir.path(), "Actor", "java", "short").unwrap();
        assert_eq!(path, existing);
        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }
}
