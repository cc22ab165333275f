// src/config/mod.rs

//! Configuration loading and validation for melter.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it into a [`CompilerConfig`] with field-level errors (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    DEFAULT_CONFIG_FILE, config_root_dir, default_config_path, load_and_validate, load_from_path,
    load_from_str, load_or_default,
};
pub use model::{CompilerConfig, OutputSetting, PathsSetting, PluginSpec, RawConfigFile};
pub use validate::{output_inside_input, validate_config};
