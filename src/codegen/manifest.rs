//! Template set manifests
//!
//! A template set is a directory holding a `config.json` manifest plus one
//! template file per manifest entry.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::EtoomapError;

/// File name of the manifest inside a template set directory
pub const MANIFEST_FILE: &str = "config.json";

/// One named template of a template set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateEntry {
    pub name: String,
    pub language: String,
    /// Extension of exported files, without the leading dot
    pub extension: String,
    pub input_type: String,
    /// Path relative to the manifest's directory
    pub template_file: String,
}

/// Parsed `config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub templates: Vec<TemplateEntry>,
}

impl Manifest {
    /// Read the manifest of the template set in `directory`
    pub fn load(directory: &Path) -> Result<Self, EtoomapError> {
        let path = directory.join(MANIFEST_FILE);
        debug!(path = ?path, "Reading template manifest");

        let body = fs::read_to_string(&path)?;
        Self::parse(&body, path)
    }

    /// Parse manifest text; `path` is only used in errors
    pub fn parse(body: &str, path: PathBuf) -> Result<Self, EtoomapError> {
        let manifest: Manifest = serde_json::from_str(body)
            .map_err(|source| EtoomapError::Manifest { path, source })?;

        trace!(templates = ?manifest.templates.len(), "Manifest loaded");
        Ok(manifest)
    }

    /// Look up an entry by name
    ///
    /// The first matching entry wins; duplicate names are a broken manifest
    /// and only logged.
    pub fn find(&self, name: &str) -> Option<&TemplateEntry> {
        let mut matches = self.templates.iter().filter(|entry| entry.name == name);
        let first = matches.next();
        let duplicates = matches.count();
        if duplicates > 0 {
            warn!(name = ?name, duplicates = ?duplicates, "Duplicate template names in manifest");
        }
        first
    }
}

/// List the templates of the set in `directory`, in manifest order
pub fn list_templates(directory: &Path) -> Result<Vec<TemplateEntry>, EtoomapError> {
    Ok(Manifest::load(directory)?.templates)
}

/// Resolve a named template in `directory` to its entry and template path
pub fn find_template(
    directory: &Path,
    name: &str,
) -> Result<(TemplateEntry, PathBuf), EtoomapError> {
    let manifest = Manifest::load(directory)?;
    let entry = manifest
        .find(name)
        .cloned()
        .ok_or_else(|| EtoomapError::TemplateNotFound {
            name: name.to_string(),
            directory: directory.to_path_buf(),
        })?;

    let path = directory.join(&entry.template_file);
    debug!(name = ?name, path = ?path, "Resolved named template");
    Ok((entry, path))
}

/// Names of the immediate subdirectories of `root`, sorted
///
/// Used to enumerate installed template sets. Files are skipped and nothing
/// below the first level is visited. Symlinks to directories count as
/// directories.
pub fn list_template_dirs(root: &Path) -> Result<Vec<String>, EtoomapError> {
    debug!(root = ?root, "Listing template directories");

    let mut names = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    trace!(directories = ?names, "Template directories found");
    Ok(names)
}
