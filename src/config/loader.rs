// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{CompilerConfig, RawConfigFile};
use crate::errors::Result;

/// Name of the config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "melter.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    load_from_str(&contents)
}

/// Parse TOML text without validating it.
pub fn load_from_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// All validation problems are reported together as
/// [`MelterError::InvalidConfig`](crate::errors::MelterError::InvalidConfig).
/// Relative `input`/`output` stay relative; see
/// [`CompilerConfig::resolve_relative_to`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<CompilerConfig> {
    let raw_config = load_from_path(&path)?;
    let config = CompilerConfig::try_from(raw_config)?;
    Ok(config)
}

/// Like [`load_and_validate`], but a missing file yields the default
/// configuration plus a warning for the caller to report.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<(CompilerConfig, Option<String>)> {
    let path = path.as_ref();
    if !path.exists() {
        let warning = format!("No config file found at {:?}, using defaults", path);
        return Ok((CompilerConfig::default(), Some(warning)));
    }
    Ok((load_and_validate(path)?, None))
}

/// Helper to resolve a default config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Directory relative config paths are anchored at.
///
/// - If the config path has a non-empty parent (e.g. "theme/melter.toml"),
///   we use that directory.
/// - If it's just a bare filename like "melter.toml" (parent = ""),
///   we fall back to the current working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
