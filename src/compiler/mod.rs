// src/compiler/mod.rs

//! Orchestration: owns the hook registry and drives
//! watcher → compilation → emitter for every batch.

pub mod runtime;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use globset::GlobSet;
use indexmap::IndexSet;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::compilation::{Compilation, CompilationStats};
use crate::config::{CompilerConfig, output_inside_input};
use crate::emitter::Emitter;
use crate::errors::{MelterError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::hooks::{ParallelHook, SeriesHook};
use crate::plugins::Plugin;
use crate::types::{AssetAction, AssetType};
use crate::watch::{PathClassifier, WatchBatch, Watcher, build_ignore_set, spawn_fs_watcher};

pub use runtime::{RuntimeEvent, RuntimeHandle};

/// Capacity of the runtime event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Compiler-level hooks, one per phase boundary.
#[derive(Debug)]
pub struct CompilerHooks {
    pub before_compile: SeriesHook<()>,
    pub compilation: SeriesHook<Compilation>,
    pub after_compile: SeriesHook<Compilation>,
    pub before_emit: SeriesHook<Compilation>,
    pub emitter: SeriesHook<Emitter>,
    pub after_emit: SeriesHook<Compilation>,
    /// Observers only; taps run concurrently.
    pub done: ParallelHook<CompilationStats>,
    pub watcher_start: SeriesHook<()>,
    pub watcher_close: SeriesHook<()>,
}

impl Default for CompilerHooks {
    fn default() -> Self {
        Self {
            before_compile: SeriesHook::new("beforeCompile"),
            compilation: SeriesHook::new("compilation"),
            after_compile: SeriesHook::new("afterCompile"),
            before_emit: SeriesHook::new("beforeEmit"),
            emitter: SeriesHook::new("emitter"),
            after_emit: SeriesHook::new("afterEmit"),
            done: ParallelHook::new("done"),
            watcher_start: SeriesHook::new("watcherStart"),
            watcher_close: SeriesHook::new("watcherClose"),
        }
    }
}

/// Options for [`Compiler::add_errors`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorOptions {
    /// Stop the run: `build()`/`watch()` return [`MelterError::Bail`].
    pub bail: bool,
}

pub struct Compiler {
    config: CompilerConfig,
    input: PathBuf,
    output: Option<PathBuf>,
    hooks: CompilerHooks,
    fs: Arc<dyn FileSystem>,
    classifier: Option<Arc<PathClassifier>>,
    ignore: Option<GlobSet>,
    events_tx: mpsc::Sender<RuntimeEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<RuntimeEvent>>>,
    fatal: Mutex<Option<String>>,
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

impl Compiler {
    /// Compiler over the real file system, with no plugins applied.
    pub fn new(config: CompilerConfig) -> Self {
        Self::with_fs(config, Arc::new(RealFileSystem))
    }

    pub fn with_fs(config: CompilerConfig, fs: Arc<dyn FileSystem>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let mut problems = Vec::new();
        let classifier = match config.paths.as_ref().map(PathClassifier::new) {
            Some(Ok(classifier)) => Some(Arc::new(classifier)),
            Some(Err(err)) => {
                problems.push(format!("{err:#}"));
                None
            }
            None => None,
        };
        let ignore = build_ignore_set(&config.ignore).unwrap_or_else(|err| {
            problems.push(format!("{err:#}"));
            None
        });

        let input = absolutize(&config.input);
        let output = config.output.as_deref().map(absolutize);
        if let Some(out) = output.as_deref().filter(|out| output_inside_input(&input, out)) {
            problems.push(format!(
                "output directory {out:?} must lie outside input directory {input:?}"
            ));
        }

        let compiler = Self {
            input,
            output,
            config,
            hooks: CompilerHooks::default(),
            fs,
            classifier,
            ignore,
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            fatal: Mutex::new(None),
        };

        if !problems.is_empty() {
            compiler.add_errors("Invalid compiler configuration", &problems, ErrorOptions { bail: true });
        }
        compiler
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn hooks(&self) -> &CompilerHooks {
        &self.hooks
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Absolute output directory, if emission is enabled.
    pub fn output_dir(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Classifier built from the configured patterns; `None` when
    /// classification is disabled.
    pub fn classifier(&self) -> Option<&Arc<PathClassifier>> {
        self.classifier.as_ref()
    }

    /// Call `apply` on each plugin, in order.
    pub fn apply_plugins(&self, plugins: &[Box<dyn Plugin>]) {
        for plugin in plugins {
            debug!(plugin = plugin.name(), "applying plugin");
            plugin.apply(self);
        }
    }

    /// Handle for closing the compiler or feeding it changes from another task.
    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle::new(self.events_tx.clone())
    }

    /// Request a graceful stop of `watch()`: the current batch finishes,
    /// `watcherClose` fires and the file watcher is dropped.
    pub async fn close(&self) {
        self.handle().close().await;
    }

    pub fn add_warnings(&self, message: &str, warnings: &[String]) {
        warn!("{message}");
        for w in warnings {
            warn!("  {w}");
        }
    }

    /// Report problems. With `bail`, the run is marked failed and a shutdown
    /// is requested.
    pub fn add_errors(&self, message: &str, errors: &[String], options: ErrorOptions) {
        error!("{message}");
        for e in errors {
            error!("  {e}");
        }
        if !options.bail {
            return;
        }

        let reason = if errors.is_empty() {
            message.to_string()
        } else {
            format!("{message}: {}", errors.join("; "))
        };
        self.fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(reason);
        // Full channel means a shutdown is already on its way or the loop is
        // busy; the fatal flag is checked again when it returns.
        let _ = self.events_tx.try_send(RuntimeEvent::ShutdownRequested);
    }

    /// Reason of the first bail, if any.
    pub fn bail_reason(&self) -> Option<String> {
        self.fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_bailed(&self) -> bool {
        self.bail_reason().is_some()
    }

    fn ensure_not_bailed(&self) -> Result<()> {
        match self.bail_reason() {
            Some(reason) => Err(MelterError::Bail(reason)),
            None => Ok(()),
        }
    }

    /// Scan the input once, compile it as a single `add` batch and stop.
    pub async fn build(&self) -> Result<CompilationStats> {
        self.ensure_not_bailed()?;
        self.prepare_output()?;

        let mut watcher = self.create_watcher();
        self.run_lifecycle_hook(&self.hooks.watcher_start).await;
        let result = match watcher.scan() {
            Ok(batch) => Ok(self.compile_batch(batch).await.stats),
            Err(err) => Err(MelterError::from(err)),
        };
        self.run_lifecycle_hook(&self.hooks.watcher_close).await;

        self.ensure_not_bailed()?;
        result
    }

    /// Compile the initial scan, then every admitted change until closed.
    pub async fn watch(&self) -> Result<()> {
        self.ensure_not_bailed()?;
        let mut events_rx = self
            .events_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(MelterError::AlreadyRunning)?;

        let result = self.watch_with(&mut events_rx).await;

        *self.events_rx.lock().unwrap_or_else(PoisonError::into_inner) = Some(events_rx);
        result?;
        self.ensure_not_bailed()
    }

    async fn watch_with(&self, events_rx: &mut mpsc::Receiver<RuntimeEvent>) -> Result<()> {
        self.prepare_output()?;

        let mut watcher = self.create_watcher();
        let handle = spawn_fs_watcher(watcher.root(), self.events_tx.clone())?;

        self.run_lifecycle_hook(&self.hooks.watcher_start).await;
        let result = match watcher.scan() {
            Ok(batch) => {
                self.compile_batch(batch).await;
                runtime::run(self, &mut watcher, events_rx).await;
                Ok(())
            }
            Err(err) => Err(MelterError::from(err)),
        };
        self.run_lifecycle_hook(&self.hooks.watcher_close).await;

        drop(handle);
        info!("file watcher closed");
        result
    }

    /// Compile an arbitrary set of input-relative paths.
    ///
    /// Paths bypass the watcher, so ignore globs and collision checks do not
    /// apply.
    pub async fn compile(&self, event: AssetAction, asset_paths: IndexSet<String>) -> Compilation {
        let mut batch = WatchBatch::new(event);
        batch.paths = asset_paths;
        self.compile_batch(batch).await
    }

    pub(crate) async fn compile_batch(&self, batch: WatchBatch) -> Compilation {
        info!(event = %batch.event, paths = batch.paths.len(), "compiling batch");

        let before = self.hooks.before_compile.call(&mut ()).await;
        if !batch.warnings.is_empty() {
            self.add_warnings("Output slot collisions", &batch.warnings);
        }

        let mut compilation =
            Compilation::new(batch.event, batch.paths, &self.input, Arc::clone(&self.fs));
        for warning in batch.warnings {
            compilation.add_warning(warning);
        }
        if let Err(err) = before {
            compilation.add_error(err.to_string());
        }

        if let Err(err) = self.hooks.compilation.call(&mut compilation).await {
            compilation.add_error(err.to_string());
        }
        compilation.create().await;
        if let Err(err) = self.hooks.after_compile.call(&mut compilation).await {
            compilation.add_error(err.to_string());
        }

        if self.output.is_some() {
            compilation = self.emit(compilation).await;
        } else {
            debug!("no output directory configured; skipping emit");
        }

        let stats = Arc::new(compilation.stats.clone());
        if let Err(err) = self.hooks.done.call(stats).await {
            self.add_errors("done hook failed", &[err.to_string()], ErrorOptions::default());
        }
        compilation
    }

    async fn emit(&self, mut compilation: Compilation) -> Compilation {
        if let Err(err) = self.hooks.before_emit.call(&mut compilation).await {
            compilation.add_error(err.to_string());
            return compilation;
        }

        let mut emitter = Emitter::new(compilation, Arc::clone(&self.fs));
        if let Err(err) = self.hooks.emitter.call(&mut emitter).await {
            emitter.compilation_mut().add_error(err.to_string());
        }
        emitter.emit().await;
        let mut compilation = emitter.into_compilation();

        if let Err(err) = self.hooks.after_emit.call(&mut compilation).await {
            compilation.add_error(err.to_string());
        }
        compilation
    }

    async fn run_lifecycle_hook(&self, hook: &SeriesHook<()>) {
        if let Err(err) = hook.call(&mut ()).await {
            self.add_errors(
                &format!("{} hook failed", hook.name()),
                &[err.to_string()],
                ErrorOptions::default(),
            );
        }
    }

    fn create_watcher(&self) -> Watcher {
        let root = self
            .fs
            .canonicalize(&self.input)
            .unwrap_or_else(|_| self.input.clone());
        Watcher::new(
            root,
            self.classifier.clone(),
            self.ignore.clone(),
            Arc::clone(&self.fs),
        )
        .with_content_hashing(self.config.use_hash)
    }

    /// Empty the output directory and lay out one directory per type.
    fn prepare_output(&self) -> Result<()> {
        let Some(output) = self.output.as_deref() else {
            return Ok(());
        };
        if !self.config.clean {
            return Ok(());
        }

        info!(?output, "cleaning output directory");
        self.fs.clear_dir(output)?;
        for ty in AssetType::CLASSIFIED {
            self.fs.create_dir_all(&output.join(ty.as_str()))?;
        }
        Ok(())
    }
}
