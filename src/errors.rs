// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MelterError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration:\n{0}")]
    InvalidConfig(FieldErrors),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("Compiler bailed: {0}")]
    Bail(String),

    #[error("Compilation finished with {0} error(s)")]
    CompilationFailed(usize),

    #[error("Compiler is already watching")]
    AlreadyRunning,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single problem found while validating configuration.
///
/// `field` uses a dotted path into the TOML document, e.g. `paths.sections[1]`
/// or `plugins[0].name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every validation problem found in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// True if any error was reported for exactly this field path.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {err}")?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, MelterError>;
