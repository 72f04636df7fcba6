use std::fs;
use std::path::{Path, PathBuf};

use etoomap::prelude::*;
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn actor() -> TableInfo {
    TableInfo::new(
        "public",
        "actor",
        vec![
            ColumnInfo::new("actor_id", Some("0".to_string()), "integer", true),
            ColumnInfo::new("first_name", None, "text", false),
            ColumnInfo::new("last_name", None, "text", false),
            ColumnInfo::new("last_update", None, "timestamp with time zone", false),
        ],
    )
}

fn extras() -> Extras {
    let mut extras = Extras::new();
    extras.insert("packageName".to_string(), "packagename".into());
    extras
}

fn expected() -> String {
    fs::read_to_string(fixtures().join("actor-simple-java-result.txt")).unwrap()
}

#[test]
fn generate_without_data_source_matches_golden_file() {
    let reference = TemplateRef::File {
        path: fixtures().join("simple-java.jinja"),
        language: "java".to_string(),
        extension: "java".to_string(),
    };

    let text = generate(&reference, &actor(), &extras()).unwrap();
    assert_eq!(text, expected());
}

#[test]
fn named_template_matches_golden_file() {
    let reference = TemplateRef::Named {
        directory: fixtures(),
        name: "simple-java".to_string(),
    };

    let text = generate(&reference, &actor(), &extras()).unwrap();
    assert_eq!(text, expected());
}

#[test]
fn export_matches_in_memory_render() {
    let out = TempDir::new().unwrap();
    let reference = TemplateRef::Named {
        directory: fixtures(),
        name: "simple-java".to_string(),
    };
    let config = CodeGenConfig::new(out.path().to_path_buf()).with_extras(extras());

    let rendered = generate(&reference, &actor(), &config.extras).unwrap();
    let path = generate_and_export(&reference, &actor(), &config).unwrap();

    assert_eq!(path, out.path().join("Actor.java"));
    assert_eq!(fs::read_to_string(path).unwrap(), rendered);
}

#[test]
fn unknown_template_name_is_reported() {
    let reference = TemplateRef::Named {
        directory: fixtures(),
        name: "kotlin-data-class".to_string(),
    };

    let err = generate(&reference, &actor(), &extras()).unwrap_err();
    assert!(matches!(err, EtoomapError::TemplateNotFound { .. }));
}

#[test]
fn fixture_manifest_lists_its_template() {
    let templates = list_templates(&fixtures()).unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].template_file, "simple-java.jinja");
    assert_eq!(templates[0].extension, "java");
}

#[test]
fn bundled_default_templates_render() {
    let directory = Path::new(env!("CARGO_MANIFEST_DIR")).join("default-templates");
    let out = TempDir::new().unwrap();

    for entry in list_templates(&directory).unwrap() {
        let reference = TemplateRef::Named {
            directory: directory.clone(),
            name: entry.name.clone(),
        };
        let config = CodeGenConfig::new(out.path().join(&entry.name)).with_extras(extras());
        let path = generate_and_export(&reference, &actor(), &config).unwrap();

        let body = fs::read_to_string(path).unwrap();
        assert!(body.contains("Actor"), "template {}", entry.name);
    }
}

#[test]
fn bundled_set_matches_default_templates_directory() {
    let directory = Path::new(env!("CARGO_MANIFEST_DIR")).join("default-templates");
    let bundled = TemplateSet::Bundled;

    assert_eq!(bundled.list_templates().unwrap(), list_templates(&directory).unwrap());
    for entry in bundled.list_templates().unwrap() {
        let from_disk = TemplateSet::Directory(directory.clone()).template(entry.name.clone());
        let embedded = bundled.template(entry.name.clone());

        assert_eq!(
            generate(&embedded, &actor(), &extras()).unwrap(),
            generate(&from_disk, &actor(), &extras()).unwrap(),
            "template {}",
            entry.name
        );
    }
}

#[test]
fn bundled_name_resolves_without_installed_sets() {
    let root = TempDir::new().unwrap();
    let set = TemplateSet::resolve(Path::new(BUNDLED_SET), Some(root.path()));

    let text = generate(&set.template("jpa-entity"), &actor(), &extras()).unwrap();
    assert!(text.contains("Actor"));
}
