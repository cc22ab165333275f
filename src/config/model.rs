// src/config/model.rs

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::watch::patterns::{PathPatterns, default_path_patterns};

/// Top-level configuration as read from `melter.toml`.
///
/// ```toml
/// input = "src"
/// output = "dist"        # or `output = false`
/// clean = false
/// stats = true
/// watch = false
/// use_hash = false
/// ignore = ["**/.DS_Store"]
///
/// [paths]                # or `paths = false`
/// sections = ['sections/[^/]*\.liquid$']
///
/// [[plugins]]
/// name = "replace"
/// from = "Hello"
/// to = "Hi"
/// ```
///
/// Every key is optional. This is the unvalidated shape; convert it with
/// `CompilerConfig::try_from` to get the validated form.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Source directory, relative to the config file's directory.
    #[serde(default = "default_input")]
    pub input: String,

    /// Output directory, or `false` to skip emission entirely.
    #[serde(default)]
    pub output: OutputSetting,

    /// Empty the output directory before the initial batch.
    #[serde(default)]
    pub clean: bool,

    /// Load the stats reporter.
    #[serde(default = "default_true")]
    pub stats: bool,

    /// Keep watching after the initial batch (the CLI `--watch` flag also
    /// turns this on).
    #[serde(default)]
    pub watch: bool,

    /// Drop `update` events whose content did not change.
    #[serde(default)]
    pub use_hash: bool,

    /// Globs, relative to `input`, for files that are never admitted.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Classification patterns, merged over the built-in table, or `false`
    /// to disable classification and target resolution.
    #[serde(default)]
    pub paths: PathsSetting,

    /// Named plugins from the built-in registry, applied in order.
    #[serde(default)]
    pub plugins: Vec<PluginSpec>,
}

fn default_input() -> String {
    "src".to_string()
}

fn default_true() -> bool {
    true
}

pub const DEFAULT_OUTPUT: &str = "dist";

impl Default for RawConfigFile {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: OutputSetting::default(),
            clean: false,
            stats: true,
            watch: false,
            use_hash: false,
            ignore: Vec::new(),
            paths: PathsSetting::default(),
            plugins: Vec::new(),
        }
    }
}

/// `output = "dir"` or `output = false`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OutputSetting {
    Enabled(bool),
    Dir(String),
}

impl Default for OutputSetting {
    fn default() -> Self {
        OutputSetting::Dir(DEFAULT_OUTPUT.to_string())
    }
}

/// `[paths]` table or `paths = false`.
///
/// Keys stay strings here so unknown type names can be reported as field
/// errors during validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PathsSetting {
    Enabled(bool),
    Patterns(IndexMap<String, Vec<String>>),
}

impl Default for PathsSetting {
    fn default() -> Self {
        PathsSetting::Enabled(true)
    }
}

/// One `[[plugins]]` entry: a registry name plus free-form options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PluginSpec {
    pub name: String,
    #[serde(flatten)]
    pub options: toml::Table,
}

impl PluginSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: toml::Table::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Validated compiler configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerConfig {
    pub input: PathBuf,
    /// `None` disables emission.
    pub output: Option<PathBuf>,
    pub clean: bool,
    pub stats: bool,
    pub watch: bool,
    pub use_hash: bool,
    pub ignore: Vec<String>,
    /// Effective classification table (defaults merged with user entries);
    /// `None` when classification is disabled.
    pub paths: Option<PathPatterns>,
    pub plugins: Vec<PluginSpec>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(default_input()),
            output: Some(PathBuf::from(DEFAULT_OUTPUT)),
            clean: false,
            stats: true,
            watch: false,
            use_hash: false,
            ignore: Vec::new(),
            paths: Some(default_path_patterns()),
            plugins: Vec::new(),
        }
    }
}

impl CompilerConfig {
    pub fn new(input: impl Into<PathBuf>, output: Option<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output,
            ..Self::default()
        }
    }

    /// Anchor relative `input`/`output` at `root`.
    pub fn resolve_relative_to(mut self, root: &Path) -> Self {
        self.input = root.join(&self.input);
        self.output = self.output.map(|out| root.join(out));
        self
    }
}
