// src/emitter.rs

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::asset::Asset;
use crate::compilation::{Compilation, CompilationStats};
use crate::fs::FileSystem;
use crate::hooks::SeriesHook;
use crate::types::AssetAction;

/// Hooks fired around the physical action for each asset.
#[derive(Debug)]
pub struct EmitterHooks {
    pub before_asset_action: SeriesHook<Asset>,
    pub after_asset_action: SeriesHook<Asset>,
}

impl Default for EmitterHooks {
    fn default() -> Self {
        Self {
            before_asset_action: SeriesHook::new("beforeAssetAction"),
            after_asset_action: SeriesHook::new("afterAssetAction"),
        }
    }
}

/// Writes or removes the target of every asset in a compilation.
///
/// Failures are recorded on the compilation stats per asset and never stop
/// the remaining assets from being processed.
pub struct Emitter {
    pub hooks: EmitterHooks,
    compilation: Compilation,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("hooks", &self.hooks)
            .field("compilation", &self.compilation)
            .finish_non_exhaustive()
    }
}

impl Emitter {
    pub fn new(compilation: Compilation, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            hooks: EmitterHooks::default(),
            compilation,
            fs,
        }
    }

    pub fn compilation(&self) -> &Compilation {
        &self.compilation
    }

    pub fn compilation_mut(&mut self) -> &mut Compilation {
        &mut self.compilation
    }

    pub fn into_compilation(self) -> Compilation {
        self.compilation
    }

    /// Process every asset in iteration order.
    pub async fn emit(&mut self) {
        let mut written = 0usize;
        let mut removed = 0usize;

        let (assets, stats) = self.compilation.assets_and_stats_mut();
        for asset in assets.iter_mut() {
            match emit_asset(&self.hooks, self.fs.as_ref(), stats, asset).await {
                Some(AssetAction::Remove) => removed += 1,
                Some(_) => written += 1,
                None => {}
            }
        }

        info!(written, removed, "emit finished");
    }
}

/// Returns the action performed, if any.
async fn emit_asset(
    hooks: &EmitterHooks,
    fs: &dyn FileSystem,
    stats: &mut CompilationStats,
    asset: &mut Asset,
) -> Option<AssetAction> {
    if let Err(err) = hooks.before_asset_action.call(asset).await {
        stats.add_error(format!("{}: {err}", asset.source.relative));
        return None;
    }

    let Some(target) = asset.target.as_ref() else {
        let message = format!("Missing target path: '{}'", asset.source.relative);
        warn!("{message}");
        stats.add_warning(message);
        return None;
    };

    let action = asset.action();
    let result = if action.is_write() {
        debug!(source = %asset.source.relative, target = ?target.absolute, "writing asset");
        fs.write(&target.absolute, &asset.content)
    } else {
        debug!(source = %asset.source.relative, target = ?target.absolute, "removing asset");
        fs.remove_file(&target.absolute)
    };

    let performed = match result {
        Ok(()) => Some(action),
        Err(err) => {
            stats.add_error(format!("{err:#}"));
            None
        }
    };

    if let Err(err) = hooks.after_asset_action.call(asset).await {
        stats.add_error(format!("{}: {err}", asset.source.relative));
    }

    performed
}
