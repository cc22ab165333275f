// src/lib.rs

pub mod asset;
pub mod cli;
pub mod compilation;
pub mod compiler;
pub mod config;
pub mod emitter;
pub mod errors;
pub mod fs;
pub mod hooks;
pub mod logging;
pub mod plugins;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

pub use crate::asset::{Asset, AssetPath};
pub use crate::compilation::{Compilation, CompilationStats};
pub use crate::compiler::{Compiler, ErrorOptions, RuntimeHandle};
pub use crate::config::CompilerConfig;
pub use crate::emitter::Emitter;
pub use crate::errors::MelterError;
pub use crate::plugins::Plugin;
pub use crate::types::{AssetAction, AssetType};

use crate::cli::CliArgs;
use crate::config::{config_root_dir, load_or_default};
use crate::fs::{FileSystem, RealFileSystem};
use crate::plugins::{PluginRegistry, builtin_plugins, resolve_plugins};

/// Build a compiler from configuration, with configured and built-in plugins
/// applied.
pub fn melter(config: CompilerConfig) -> Compiler {
    melter_with_plugins(config, Vec::new())
}

/// Like [`melter`], with extra plugin values applied first.
pub fn melter_with_plugins(config: CompilerConfig, plugins: Vec<Box<dyn Plugin>>) -> Compiler {
    melter_with_fs(config, plugins, Arc::new(RealFileSystem))
}

/// Like [`melter_with_plugins`], over a custom file system.
///
/// Plugin order: `plugins`, then `[[plugins]]` from the config, then the
/// stats reporter, then path resolution.
pub fn melter_with_fs(
    config: CompilerConfig,
    plugins: Vec<Box<dyn Plugin>>,
    fs: Arc<dyn FileSystem>,
) -> Compiler {
    let compiler = Compiler::with_fs(config, fs);
    compiler.apply_plugins(&plugins);

    let configured = resolve_plugins(&compiler, &PluginRegistry::builtin(), &compiler.config().plugins);
    compiler.apply_plugins(&configured);

    let builtins = builtin_plugins(&compiler);
    compiler.apply_plugins(&builtins);
    compiler
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (missing file → defaults)
/// - plugin resolution
/// - one-shot build, or watch mode with Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let (config, missing) = load_or_default(&config_path)?;
    if let Some(warning) = missing {
        warn!("{warning}");
    }
    let config = config.resolve_relative_to(&config_root_dir(&config_path));

    if args.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    let watch = args.watch || config.watch;
    let compiler = melter(config);

    if watch {
        // Ctrl-C → graceful shutdown.
        let handle = compiler.handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; closing");
            handle.close().await;
        });
        compiler.watch().await?;
    } else {
        let stats = compiler.build().await?;
        if stats.has_errors() {
            return Err(MelterError::CompilationFailed(stats.errors.len()).into());
        }
    }
    Ok(())
}

/// Simple dry-run output: resolved settings, classifier table and plugins.
fn print_dry_run(config: &CompilerConfig) {
    println!("melter dry-run");
    println!("  input  = {}", config.input.display());
    match &config.output {
        Some(output) => println!("  output = {}", output.display()),
        None => println!("  output = (disabled)"),
    }
    println!("  clean = {}", config.clean);
    println!("  stats = {}", config.stats);
    println!("  watch = {}", config.watch);
    println!("  use_hash = {}", config.use_hash);
    if !config.ignore.is_empty() {
        println!("  ignore = {:?}", config.ignore);
    }
    println!();

    match &config.paths {
        Some(paths) => {
            println!("paths ({} types, first match wins):", paths.len());
            for (ty, patterns) in paths {
                println!("  - {ty}");
                for pattern in patterns {
                    println!("      {pattern}");
                }
            }
        }
        None => println!("paths: disabled (files are not classified or emitted)"),
    }
    println!();

    println!("plugins ({}):", config.plugins.len());
    for spec in &config.plugins {
        println!("  - {}", spec.name);
        for (key, value) in &spec.options {
            println!("      {key} = {value}");
        }
    }

    debug!("dry-run complete (no files touched)");
}
