//! Template resolution and compilation

use std::fmt;
use std::fs;
use std::path::PathBuf;

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use tracing::{debug, trace};

use super::bundled;
use super::manifest::find_template;
use super::types::TargetLanguage;
use crate::error::EtoomapError;

/// Where a template comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    /// A template file given directly; the caller supplies what a manifest
    /// entry would otherwise provide
    File {
        path: PathBuf,
        language: String,
        extension: String,
    },
    /// A named entry of the template set in `directory`
    Named { directory: PathBuf, name: String },
    /// A named entry of the set compiled into the binary
    Bundled { name: String },
}

/// A compiled template ready to render
pub struct Template {
    env: Environment<'static>,
    name: String,
    language: TargetLanguage,
    extension: String,
}

impl Template {
    /// Resolve, read and compile a template
    pub fn load(reference: &TemplateRef) -> Result<Self, EtoomapError> {
        match reference {
            TemplateRef::File {
                path,
                language,
                extension,
            } => {
                debug!(path = ?path, "Loading template file");
                let source = fs::read_to_string(path)?;
                let name = path.to_string_lossy().into_owned();
                Self::from_source(name, source, language.parse()?, extension.clone())
            }
            TemplateRef::Named { directory, name } => {
                let (entry, path) = find_template(directory, name)?;
                debug!(name = ?name, path = ?path, "Loading named template");
                let source = fs::read_to_string(&path)?;
                Self::from_source(entry.name, source, entry.language.parse()?, entry.extension)
            }
            TemplateRef::Bundled { name } => {
                let (entry, source) = bundled::find_template(name)?;
                debug!(name = ?name, "Loading bundled template");
                Self::from_source(
                    entry.name,
                    source.to_string(),
                    entry.language.parse()?,
                    entry.extension,
                )
            }
        }
    }

    /// Compile a template from its source text
    ///
    /// Block tags on a line of their own do not leave blank lines behind, and
    /// a trailing newline in the source is kept. Output is never escaped,
    /// whatever the template name's extension.
    pub fn from_source(
        name: String,
        source: String,
        language: TargetLanguage,
        extension: String,
    ) -> Result<Self, EtoomapError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_template_owned(name.clone(), source)?;
        trace!(template = ?name, language = ?language, "Template compiled");

        Ok(Self {
            env,
            name,
            language,
            extension,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Language column types are mapped to before rendering
    pub fn language(&self) -> TargetLanguage {
        self.language
    }

    /// Extension of exported files, without the leading dot
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Render the template; returns once the whole text is produced
    pub fn render<S: Serialize>(&self, payload: S) -> Result<String, EtoomapError> {
        let template = self.env.get_template(&self.name)?;
        Ok(template.render(payload)?)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("language", &self.language)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}
