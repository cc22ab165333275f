// tests/config_files.rs

use std::io::Write;
use std::path::{Path, PathBuf};

use melter::config::{DEFAULT_CONFIG_FILE, config_root_dir, load_and_validate, load_or_default};
use melter::errors::MelterError;
use melter::types::AssetType;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_full_config_is_loaded_and_merged_with_defaults() {
    let file = config_file(
        r#"
input = "theme"
output = "build"
clean = true
stats = false
use_hash = true
ignore = ["**/*.bak"]

[paths]
snippets = ['partials/[^/]*\.liquid$']

[[plugins]]
name = "replace"
from = "Hello"
to = "Hi"
"#,
    );

    let config = load_and_validate(file.path()).unwrap();

    assert_eq!(config.input, PathBuf::from("theme"));
    assert_eq!(config.output, Some(PathBuf::from("build")));
    assert!(config.clean);
    assert!(!config.stats);
    assert!(config.use_hash);
    assert_eq!(config.ignore, ["**/*.bak"]);

    let paths = config.paths.unwrap();
    assert_eq!(paths.len(), 7);
    assert_eq!(paths[&AssetType::Snippets], [r"partials/[^/]*\.liquid$"]);
    // Overridden types keep their default position.
    assert_eq!(paths.get_index_of(&AssetType::Snippets), Some(5));
    assert_eq!(paths[&AssetType::Sections], [r"sections/[^/]*\.liquid$"]);

    assert_eq!(config.plugins.len(), 1);
    assert_eq!(config.plugins[0].name, "replace");
    assert_eq!(
        config.plugins[0].options.get("to").and_then(|v| v.as_str()),
        Some("Hi")
    );
}

#[test]
fn test_empty_file_yields_defaults() {
    let file = config_file("");

    let config = load_and_validate(file.path()).unwrap();

    assert_eq!(config.input, PathBuf::from("src"));
    assert_eq!(config.output, Some(PathBuf::from("dist")));
    assert!(config.stats);
    assert!(!config.clean);
    assert_eq!(config.paths.map(|p| p.len()), Some(7));
}

#[test]
fn test_output_and_paths_can_be_disabled() {
    let file = config_file("output = false\npaths = false\n");

    let config = load_and_validate(file.path()).unwrap();

    assert_eq!(config.output, None);
    assert_eq!(config.paths, None);
}

#[test]
fn test_all_field_problems_are_reported_together() {
    let file = config_file(
        r#"
ignore = ["a/{b"]

[paths]
widgets = ['widgets/.*']
sections = ['sections/(unclosed']

[[plugins]]
name = "minify"
"#,
    );

    match load_and_validate(file.path()) {
        Err(MelterError::InvalidConfig(errors)) => {
            assert!(errors.has_field("paths.widgets"), "{errors}");
            assert!(errors.has_field("paths.sections[0]"), "{errors}");
            assert!(errors.has_field("ignore[0]"), "{errors}");
            assert!(errors.has_field("plugins[0].name"), "{errors}");
            assert_eq!(errors.len(), 4, "{errors}");
        }
        Err(e) => panic!("Expected InvalidConfig error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_output_nested_in_input_is_rejected() {
    let file = config_file("input = \"theme\"\noutput = \"theme/dist\"\n");

    match load_and_validate(file.path()) {
        Err(MelterError::InvalidConfig(errors)) => {
            assert!(errors.has_field("output"), "{errors}");
            assert!(errors.to_string().contains("must not be inside `input`"));
            assert_eq!(errors.len(), 1, "{errors}");
        }
        Err(e) => panic!("Expected InvalidConfig error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_sibling_with_shared_prefix_is_not_nested() {
    let file = config_file("input = \"theme\"\noutput = \"theme-dist\"\n");

    let config = load_and_validate(file.path()).unwrap();
    assert_eq!(config.output, Some(PathBuf::from("theme-dist")));
}

#[test]
fn test_malformed_toml_returns_toml_error() {
    let file = config_file("input = [unterminated");

    match load_and_validate(file.path()) {
        Err(MelterError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_missing_file_falls_back_to_defaults_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILE);

    let (config, warning) = load_or_default(&path).unwrap();

    assert_eq!(config.input, PathBuf::from("src"));
    let warning = warning.expect("missing file should warn");
    assert!(warning.contains("No config file found"));
}

#[test]
fn test_relative_dirs_resolve_against_config_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    std::fs::write(&path, "input = \"theme\"\noutput = \"out\"\n").unwrap();

    let config = load_and_validate(&path)
        .unwrap()
        .resolve_relative_to(&config_root_dir(&path));

    assert_eq!(config.input, dir.path().join("theme"));
    assert_eq!(config.output, Some(dir.path().join("out")));
}

#[test]
fn test_bare_config_name_is_rooted_at_current_dir() {
    let root = config_root_dir(Path::new(DEFAULT_CONFIG_FILE));
    assert_eq!(root, std::env::current_dir().unwrap());
}
