// src/config/validate.rs

use std::path::{Path, PathBuf};

use globset::Glob;
use indexmap::IndexMap;
use regex::Regex;

use crate::config::model::{
    CompilerConfig, DEFAULT_OUTPUT, OutputSetting, PathsSetting, RawConfigFile,
};
use crate::errors::{FieldErrors, MelterError, Result};
use crate::plugins::PluginRegistry;
use crate::types::AssetType;
use crate::watch::patterns::{PathPatterns, default_path_patterns, merge_path_patterns};

impl TryFrom<RawConfigFile> for CompilerConfig {
    type Error = MelterError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let mut errors = FieldErrors::default();

        let output = match raw.output {
            OutputSetting::Enabled(false) => None,
            OutputSetting::Enabled(true) => Some(PathBuf::from(DEFAULT_OUTPUT)),
            OutputSetting::Dir(dir) if dir.trim().is_empty() => {
                errors.push(
                    "output",
                    "must not be empty (use `output = false` to disable emission)",
                );
                None
            }
            OutputSetting::Dir(dir) => Some(PathBuf::from(dir)),
        };

        let paths = match raw.paths {
            PathsSetting::Enabled(false) => None,
            PathsSetting::Enabled(true) => Some(default_path_patterns()),
            PathsSetting::Patterns(table) => Some(parse_path_table(&table, &mut errors)),
        };

        let config = CompilerConfig {
            input: PathBuf::from(raw.input),
            output,
            clean: raw.clean,
            stats: raw.stats,
            watch: raw.watch,
            use_hash: raw.use_hash,
            ignore: raw.ignore,
            paths,
            plugins: raw.plugins,
        };

        collect_config_errors(&config, &mut errors);
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(MelterError::InvalidConfig(errors))
        }
    }
}

/// Check a config built in code the same way a loaded one is checked.
pub fn validate_config(config: &CompilerConfig) -> Result<()> {
    let mut errors = FieldErrors::default();
    collect_config_errors(config, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(MelterError::InvalidConfig(errors))
    }
}

/// True when `output` is `input` or a directory below it, after making both
/// absolute. Such an output would be scanned as source on the next run.
pub fn output_inside_input(input: &Path, output: &Path) -> bool {
    let absolute = |p: &Path| std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf());
    absolute(output).starts_with(absolute(input))
}

fn parse_path_table(table: &IndexMap<String, Vec<String>>, errors: &mut FieldErrors) -> PathPatterns {
    let mut user = PathPatterns::new();
    for (key, patterns) in table {
        match key.parse::<AssetType>() {
            Ok(AssetType::Unclassified) => errors.push(
                format!("paths.{key}"),
                "reserved for files that match no pattern",
            ),
            Ok(ty) => {
                user.insert(ty, patterns.clone());
            }
            Err(msg) => errors.push(format!("paths.{key}"), msg),
        }
    }
    merge_path_patterns(&user)
}

fn collect_config_errors(config: &CompilerConfig, errors: &mut FieldErrors) {
    if config.input.as_os_str().is_empty() {
        errors.push("input", "must not be empty");
    }

    if let Some(output) = &config.output {
        if *output == config.input {
            errors.push("output", "must differ from `input`");
        } else if output_inside_input(&config.input, output) {
            errors.push("output", "must not be inside `input`");
        }
    }

    if let Some(paths) = &config.paths {
        for (ty, patterns) in paths {
            if patterns.is_empty() {
                errors.push(format!("paths.{ty}"), "expected at least one pattern");
            }
            for (i, pattern) in patterns.iter().enumerate() {
                if let Err(e) = Regex::new(pattern) {
                    errors.push(
                        format!("paths.{ty}[{i}]"),
                        format!("invalid regular expression: {e}"),
                    );
                }
            }
        }
    }

    for (i, pattern) in config.ignore.iter().enumerate() {
        if let Err(e) = Glob::new(pattern) {
            errors.push(format!("ignore[{i}]"), format!("invalid glob: {e}"));
        }
    }

    let registry = PluginRegistry::builtin();
    for (i, spec) in config.plugins.iter().enumerate() {
        if !registry.contains(&spec.name) {
            errors.push(
                format!("plugins[{i}].name"),
                format!(
                    "unknown plugin '{}' (available: {})",
                    spec.name,
                    registry.names().collect::<Vec<_>>().join(", ")
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::PluginSpec;

    fn parse(toml_src: &str) -> Result<CompilerConfig> {
        let raw: RawConfigFile = toml::from_str(toml_src)?;
        CompilerConfig::try_from(raw)
    }

    fn field_errors(toml_src: &str) -> FieldErrors {
        match parse(toml_src) {
            Err(MelterError::InvalidConfig(errors)) => errors,
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg, CompilerConfig::default());
    }

    #[test]
    fn output_false_and_paths_false_disable_features() {
        let cfg = parse("output = false\npaths = false\n").unwrap();
        assert_eq!(cfg.output, None);
        assert_eq!(cfg.paths, None);
    }

    #[test]
    fn user_paths_keep_declaration_order_after_defaults() {
        let cfg = parse(
            r#"
            [paths]
            templates = ['pages/[^/]*\.liquid$']
            sections = ['blocks/[^/]*\.liquid$', 'sections/[^/]*\.liquid$']
            "#,
        )
        .unwrap();
        let paths = cfg.paths.unwrap();
        let order: Vec<_> = paths.keys().copied().collect();
        assert_eq!(order, AssetType::CLASSIFIED);
        assert_eq!(paths[&AssetType::Sections].len(), 2);
        assert_eq!(paths[&AssetType::Templates], [r"pages/[^/]*\.liquid$"]);
    }

    #[test]
    fn every_problem_is_reported_with_its_field() {
        let errors = field_errors(
            r#"
            input = "src"
            output = "src"
            ignore = ["ok/**", "bad/[", "also-ok"]

            [paths]
            sections = []
            snippets = ['ok', '(']
            widgets = ['x']

            [[plugins]]
            name = "replace"
            from = "a"
            to = "b"

            [[plugins]]
            name = "minify"
            "#,
        );

        for field in [
            "output",
            "ignore[1]",
            "paths.sections",
            "paths.snippets[1]",
            "paths.widgets",
            "plugins[1].name",
        ] {
            assert!(errors.has_field(field), "missing {field} in {errors}");
        }
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn programmatic_configs_are_validated_too() {
        let mut cfg = CompilerConfig::new("", Some(PathBuf::from("dist")));
        cfg.plugins.push(PluginSpec::new("nope"));
        match validate_config(&cfg) {
            Err(MelterError::InvalidConfig(errors)) => {
                assert!(errors.has_field("input"));
                assert!(errors.has_field("plugins[0].name"));
            }
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }
}
