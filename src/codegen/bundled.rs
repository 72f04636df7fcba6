//! Template set compiled into the binary
//!
//! The `default-templates` set ships inside the crate so it is available
//! without installing anything under the template root.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::manifest::{list_templates, Manifest, TemplateEntry, MANIFEST_FILE};
use super::template::TemplateRef;
use crate::error::EtoomapError;

/// Name the bundled set is listed and selected under
pub const BUNDLED_SET: &str = "default-templates";

const FILES: &[(&str, &str)] = &[
    (
        MANIFEST_FILE,
        include_str!("../../default-templates/config.json"),
    ),
    (
        "jpa-entity.jinja",
        include_str!("../../default-templates/jpa-entity.jinja"),
    ),
    (
        "pojo.jinja",
        include_str!("../../default-templates/pojo.jinja"),
    ),
];

fn file(name: &str) -> Option<&'static str> {
    FILES
        .iter()
        .find(|(file_name, _)| *file_name == name)
        .map(|(_, body)| *body)
}

fn set_path() -> PathBuf {
    PathBuf::from(BUNDLED_SET)
}

/// Manifest of the bundled set
pub fn manifest() -> Result<Manifest, EtoomapError> {
    let body = file(MANIFEST_FILE).unwrap_or_default();
    Manifest::parse(body, set_path().join(MANIFEST_FILE))
}

/// Resolve a named bundled template to its entry and source text
pub fn find_template(name: &str) -> Result<(TemplateEntry, &'static str), EtoomapError> {
    let not_found = || EtoomapError::TemplateNotFound {
        name: name.to_string(),
        directory: set_path(),
    };

    let manifest = manifest()?;
    let entry = manifest.find(name).cloned().ok_or_else(not_found)?;
    let source = file(&entry.template_file).ok_or_else(not_found)?;

    debug!(name = ?name, file = ?entry.template_file, "Resolved bundled template");
    Ok((entry, source))
}

/// A template set selected by directory or by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSet {
    Directory(PathBuf),
    Bundled,
}

impl TemplateSet {
    /// Pick the set `dir` refers to
    ///
    /// The bare name `default-templates` selects an installed set of that
    /// name under `root`, else the bundled set; spell it `./default-templates`
    /// to use a local directory. Any other `dir` is used as given when it
    /// exists, else looked up under `root`.
    pub fn resolve(dir: &Path, root: Option<&Path>) -> Self {
        let installed = root.map(|root| root.join(dir));

        if dir == Path::new(BUNDLED_SET) {
            return match installed.filter(|path| path.exists()) {
                Some(path) => Self::Directory(path),
                None => Self::Bundled,
            };
        }

        if dir.exists() {
            return Self::Directory(dir.to_path_buf());
        }
        Self::Directory(installed.unwrap_or_else(|| dir.to_path_buf()))
    }

    pub fn list_templates(&self) -> Result<Vec<TemplateEntry>, EtoomapError> {
        match self {
            Self::Directory(directory) => list_templates(directory),
            Self::Bundled => Ok(manifest()?.templates),
        }
    }

    /// Reference to the template `name` of this set
    pub fn template(&self, name: impl Into<String>) -> TemplateRef {
        match self {
            Self::Directory(directory) => TemplateRef::Named {
                directory: directory.clone(),
                name: name.into(),
            },
            Self::Bundled => TemplateRef::Bundled { name: name.into() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_every_bundled_entry_has_its_file() {
        let templates = manifest().unwrap().templates;
        let names: Vec<_> = templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["jpa-entity", "pojo"]);

        for entry in &templates {
            assert!(file(&entry.template_file).is_some(), "{}", entry.template_file);
        }
    }

    #[test]
    fn test_find_bundled_template() {
        let (entry, source) = find_template("pojo").unwrap();
        assert_eq!(entry.extension, "java");
        assert!(source.contains("tableName"));
    }

    #[test]
    fn test_find_bundled_template_missing() {
        let err = find_template("kotlin-data-class").unwrap_err();
        assert!(matches!(
            err,
            EtoomapError::TemplateNotFound { directory, .. } if directory == Path::new(BUNDLED_SET)
        ));
    }

    #[test]
    fn test_resolve_bundled_name_without_installed_copy() {
        let root = TempDir::new().unwrap();
        let set = TemplateSet::resolve(Path::new(BUNDLED_SET), Some(root.path()));
        assert_eq!(set, TemplateSet::Bundled);
        assert_eq!(set.list_templates().unwrap().len(), 2);
        assert_eq!(
            set.template("pojo"),
            TemplateRef::Bundled {
                name: "pojo".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_bundled_name_without_root() {
        assert_eq!(TemplateSet::resolve(Path::new(BUNDLED_SET), None), TemplateSet::Bundled);
    }

    #[test]
    fn test_installed_set_overrides_bundled() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join(BUNDLED_SET)).unwrap();

        let set = TemplateSet::resolve(Path::new(BUNDLED_SET), Some(root.path()));
        assert_eq!(set, TemplateSet::Directory(root.path().join(BUNDLED_SET)));
    }

    #[test]
    fn test_resolve_existing_path_and_installed_name() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("java-basic")).unwrap();

        let by_path = TemplateSet::resolve(&root.path().join("java-basic"), None);
        assert_eq!(by_path, TemplateSet::Directory(root.path().join("java-basic")));

        let by_name = TemplateSet::resolve(Path::new("java-basic"), Some(root.path()));
        assert_eq!(by_name, TemplateSet::Directory(root.path().join("java-basic")));
    }

    #[test]
    fn test_resolve_unknown_name_points_under_root() {
        let root = TempDir::new().unwrap();
        let set = TemplateSet::resolve(Path::new("not-installed"), Some(root.path()));
        assert_eq!(set, TemplateSet::Directory(root.path().join("not-installed")));
        assert!(matches!(set.list_templates(), Err(EtoomapError::Io(_))));
    }
}
