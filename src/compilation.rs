// src/compilation.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexSet;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::asset::{Asset, AssetPath};
use crate::fs::FileSystem;
use crate::hooks::SeriesHook;
use crate::types::AssetAction;

/// Aggregate result of one compilation, handed to `done` taps.
///
/// Only ever appended to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationStats {
    pub time: Duration,
    /// Source relative paths of admitted assets, in completion order.
    pub assets: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl CompilationStats {
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Hooks fired once per asset while a compilation constructs its assets.
#[derive(Debug)]
pub struct CompilationHooks {
    pub before_add_asset: SeriesHook<Asset>,
    pub after_add_asset: SeriesHook<Asset>,
}

impl Default for CompilationHooks {
    fn default() -> Self {
        Self {
            before_add_asset: SeriesHook::new("beforeAddAsset"),
            after_add_asset: SeriesHook::new("afterAddAsset"),
        }
    }
}

/// One build pass over a batch of paths sharing an event kind.
///
/// Created per batch and dropped after `done`; never reused.
pub struct Compilation {
    event: AssetAction,
    asset_paths: IndexSet<String>,
    assets: Vec<Asset>,
    pub stats: CompilationStats,
    /// Shared with the construction tasks, so taps registered here are seen
    /// by every asset of the batch.
    pub hooks: Arc<CompilationHooks>,
    input: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for Compilation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compilation")
            .field("event", &self.event)
            .field("asset_paths", &self.asset_paths)
            .field("assets", &self.assets.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

struct Constructed {
    asset: Option<Asset>,
    errors: Vec<String>,
}

impl Compilation {
    /// `asset_paths` are relative to `input`.
    pub fn new(
        event: AssetAction,
        asset_paths: IndexSet<String>,
        input: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            event,
            asset_paths,
            assets: Vec::new(),
            stats: CompilationStats::default(),
            hooks: Arc::new(CompilationHooks::default()),
            input: input.into(),
            fs,
        }
    }

    pub fn event(&self) -> AssetAction {
        self.event
    }

    pub fn asset_paths(&self) -> &IndexSet<String> {
        &self.asset_paths
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut [Asset] {
        &mut self.assets
    }

    /// Admitted asset with the given source relative path.
    pub fn asset(&self, rel_path: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.source.relative == rel_path)
    }

    /// Resolve `asset.links` against this compilation.
    pub fn linked_assets<'a>(&'a self, asset: &'a Asset) -> impl Iterator<Item = &'a Asset> + 'a {
        asset.links.iter().filter_map(|rel| self.asset(rel))
    }

    pub(crate) fn assets_and_stats_mut(&mut self) -> (&mut Vec<Asset>, &mut CompilationStats) {
        (&mut self.assets, &mut self.stats)
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.stats.add_warning(message);
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.stats.add_error(message);
    }

    /// Construct one asset per path, concurrently.
    ///
    /// Each construction reads the source, then runs `beforeAddAsset` and
    /// `afterAddAsset`. A failing `beforeAddAsset` keeps the asset out of
    /// the batch; a failing `afterAddAsset` is recorded but the asset stays.
    /// Assets land in completion order.
    pub async fn create(&mut self) {
        let start = Instant::now();
        let mut set = JoinSet::new();

        for rel in self.asset_paths.iter().cloned() {
            let source = AssetPath::under(&self.input, rel);
            let hooks = Arc::clone(&self.hooks);
            let fs = Arc::clone(&self.fs);
            let action = self.event;
            set.spawn(async move { construct_asset(source, action, hooks, fs).await });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Constructed { asset, errors }) => {
                    for err in errors {
                        self.stats.add_error(err);
                    }
                    if let Some(asset) = asset {
                        self.stats.assets.push(asset.source.relative.clone());
                        self.assets.push(asset);
                    }
                }
                Err(join_err) => {
                    self.stats
                        .add_error(format!("asset construction did not complete: {join_err}"));
                }
            }
        }

        self.stats.time = start.elapsed();
        info!(
            event = %self.event,
            assets = self.assets.len(),
            elapsed_ms = self.stats.time.as_millis() as u64,
            "compilation created"
        );
    }
}

async fn construct_asset(
    source: AssetPath,
    action: AssetAction,
    hooks: Arc<CompilationHooks>,
    fs: Arc<dyn FileSystem>,
) -> Constructed {
    let mut asset = Asset::load(source, action, fs.as_ref());
    debug!(path = %asset.source.relative, %action, bytes = asset.content.len(), "asset loaded");

    if let Err(err) = hooks.before_add_asset.call(&mut asset).await {
        return Constructed {
            asset: None,
            errors: vec![format!("{}: {err}", asset.source.relative)],
        };
    }

    let mut errors = Vec::new();
    if let Err(err) = hooks.after_add_asset.call(&mut asset).await {
        errors.push(format!("{}: {err}", asset.source.relative));
    }

    Constructed {
        asset: Some(asset),
        errors,
    }
}
