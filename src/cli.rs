// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Command-line arguments for `melter`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "melter",
    version,
    about = "Classify theme source files and emit them into a typed output layout.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Relative `input`/`output` values are resolved against this file's
    /// directory. A missing file means default settings.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Keep watching for changes after the initial build.
    #[arg(long)]
    pub watch: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MELTER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved configuration, but don't touch
    /// any files.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_flags_parse() {
        let args = CliArgs::try_parse_from(["melter"]).unwrap();
        assert_eq!(args.config, "melter.toml");
        assert!(!args.watch && !args.dry_run);
        assert_eq!(args.log_level, None);

        let args = CliArgs::try_parse_from([
            "melter",
            "--config",
            "theme/melter.toml",
            "--watch",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.config, "theme/melter.toml");
        assert!(args.watch);
        assert_eq!(args.log_level, Some(LogLevel::Debug));
    }
}
