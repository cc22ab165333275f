#![allow(dead_code)]

use std::path::PathBuf;

use melter::config::{CompilerConfig, PluginSpec, validate_config};
use melter::types::AssetType;
use melter::watch::default_path_patterns;

/// Builder for `CompilerConfig` to simplify test setup.
///
/// Starts from the defaults with `stats = false`, so test output stays quiet.
pub struct CompilerConfigBuilder {
    config: CompilerConfig,
}

impl CompilerConfigBuilder {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let mut config = CompilerConfig::new(input, Some(output.into()));
        config.stats = false;
        Self { config }
    }

    pub fn without_output(mut self) -> Self {
        self.config.output = None;
        self
    }

    pub fn clean(mut self, val: bool) -> Self {
        self.config.clean = val;
        self
    }

    pub fn stats(mut self, val: bool) -> Self {
        self.config.stats = val;
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.config.use_hash = val;
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.ignore.push(pattern.to_string());
        self
    }

    pub fn without_paths(mut self) -> Self {
        self.config.paths = None;
        self
    }

    /// Replace the patterns for one type, keeping its position.
    pub fn paths(mut self, ty: AssetType, patterns: &[&str]) -> Self {
        self.config
            .paths
            .get_or_insert_with(default_path_patterns)
            .insert(ty, patterns.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn plugin(mut self, spec: PluginSpec) -> Self {
        self.config.plugins.push(spec);
        self
    }

    /// Build without validating, for tests that exercise invalid configs.
    pub fn build_unchecked(self) -> CompilerConfig {
        self.config
    }

    pub fn build(self) -> CompilerConfig {
        validate_config(&self.config).expect("Failed to build valid config from builder");
        self.config
    }
}
