// src/watch/watcher.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use globset::GlobSet;
use indexmap::IndexSet;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::compiler::RuntimeEvent;
use crate::fs::{FileSystem, collect_files};
use crate::types::AssetAction;
use crate::watch::cache::{AssetIdentity, Claim, FileIdentityCache};
use crate::watch::hash::ContentHashCache;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{PathClassifier, normalize_path, output_filename};

/// A set of relative paths sharing one event kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBatch {
    pub event: AssetAction,
    pub paths: IndexSet<String>,
    /// Collision warnings produced while admitting this batch.
    pub warnings: Vec<String>,
}

impl WatchBatch {
    pub fn new(event: AssetAction) -> Self {
        Self {
            event,
            paths: IndexSet::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.warnings.is_empty()
    }
}

/// Outcome of checking one candidate path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Forward the path to the compiler.
    Forward,
    /// Another source already owns the output slot.
    Collision(String),
    /// Matched an ignore glob.
    Ignored,
    /// No classification pattern matched.
    Unclassified,
    /// `use_hash` is on and the bytes did not change.
    Unchanged,
    /// Removal of a path that never owned its output slot.
    NotOwner,
}

/// Decides which file-system changes become compile batches.
///
/// Owns the identity cache; everything here runs on the runtime loop, so the
/// cache needs no locking.
pub struct Watcher {
    root: PathBuf,
    classifier: Option<Arc<PathClassifier>>,
    ignore: Option<GlobSet>,
    identities: FileIdentityCache,
    hashes: Option<ContentHashCache>,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("root", &self.root)
            .field("classifier", &self.classifier)
            .field("identities", &self.identities)
            .finish_non_exhaustive()
    }
}

impl Watcher {
    /// `classifier = None` disables classification: every non-ignored file is
    /// forwarded and the identity cache is bypassed.
    pub fn new(
        root: impl Into<PathBuf>,
        classifier: Option<Arc<PathClassifier>>,
        ignore: Option<GlobSet>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            root: root.into(),
            classifier,
            ignore,
            identities: FileIdentityCache::new(),
            hashes: None,
            fs,
        }
    }

    /// Suppress `update` events whose content hash did not change.
    pub fn with_content_hashing(mut self, enabled: bool) -> Self {
        self.hashes = enabled.then(ContentHashCache::new);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn identities(&self) -> &FileIdentityCache {
        &self.identities
    }

    /// Walk the input directory and admit every file as an `add`.
    pub fn scan(&mut self) -> Result<WatchBatch> {
        let mut batch = WatchBatch::new(AssetAction::Add);
        for path in collect_files(self.fs.as_ref(), &self.root)? {
            let Some(rel) = relative_str(&self.root, &path) else {
                continue;
            };
            self.admit_into(&mut batch, &rel);
        }
        info!(
            root = ?self.root,
            paths = batch.paths.len(),
            collisions = batch.warnings.len(),
            "initial scan complete"
        );
        Ok(batch)
    }

    /// Single-path batch for a live event, or `None` if nothing is forwarded.
    pub fn batch_for(&mut self, action: AssetAction, rel_path: &str) -> Option<WatchBatch> {
        let mut batch = WatchBatch::new(action);
        self.admit_into(&mut batch, rel_path);
        (!batch.is_empty()).then_some(batch)
    }

    fn admit_into(&mut self, batch: &mut WatchBatch, rel_path: &str) {
        let rel_path = normalize_path(rel_path);
        match self.admit(batch.event, &rel_path) {
            Admission::Forward => {
                batch.paths.insert(rel_path);
            }
            Admission::Collision(warning) => {
                debug!(path = %rel_path, "collision");
                batch.warnings.push(warning);
            }
            other => {
                debug!(path = %rel_path, admission = ?other, "path not forwarded");
            }
        }
    }

    /// Check one candidate path and update the identity cache.
    pub fn admit(&mut self, action: AssetAction, rel_path: &str) -> Admission {
        if self.is_ignored(rel_path) {
            return Admission::Ignored;
        }

        let Some(classifier) = &self.classifier else {
            return self.check_content(action, rel_path);
        };
        let Some(asset_type) = classifier.classify(rel_path) else {
            return Admission::Unclassified;
        };
        let identity = AssetIdentity::new(asset_type, output_filename(rel_path));

        match action {
            AssetAction::Add | AssetAction::Update => {
                match self.identities.claim(identity.clone(), rel_path) {
                    Claim::Collision { owner } => {
                        Admission::Collision(collision_message(rel_path, &identity, &owner))
                    }
                    Claim::Claimed | Claim::AlreadyOwned => self.check_content(action, rel_path),
                }
            }
            AssetAction::Remove => {
                let owned_elsewhere = self
                    .identities
                    .owner(&identity)
                    .is_some_and(|owner| owner != rel_path);
                if owned_elsewhere {
                    return Admission::NotOwner;
                }
                self.identities.release(&identity, rel_path);
                self.check_content(action, rel_path)
            }
        }
    }

    fn is_ignored(&self, rel_path: &str) -> bool {
        self.ignore
            .as_ref()
            .is_some_and(|set| set.is_match(rel_path))
    }

    fn check_content(&mut self, action: AssetAction, rel_path: &str) -> Admission {
        let Some(hashes) = self.hashes.as_mut() else {
            return Admission::Forward;
        };
        if action == AssetAction::Remove {
            hashes.forget(rel_path);
            return Admission::Forward;
        }
        let Ok(contents) = self.fs.read(&self.root.join(rel_path)) else {
            return Admission::Forward;
        };
        let changed = hashes.record(rel_path, &contents);
        if action == AssetAction::Update && !changed {
            Admission::Unchanged
        } else {
            Admission::Forward
        }
    }
}

fn collision_message(rel_path: &str, identity: &AssetIdentity, owner: &str) -> String {
    format!(
        "{rel_path}: File '{}' of type '{}' already exists in '{owner}'",
        identity.filename, identity.asset_type
    )
}

/// Map one notify event onto asset actions.
///
/// Directory creation and removal, access and metadata events are dropped.
/// Renames become a `remove` of the old path and an `add` of the new one.
pub fn changes_from_event(event: &Event) -> Vec<(AssetAction, PathBuf)> {
    let all = |action: AssetAction| -> Vec<(AssetAction, PathBuf)> {
        event.paths.iter().map(|p| (action, p.clone())).collect()
    };

    match &event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_) => all(AssetAction::Add),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => all(AssetAction::Remove),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => all(AssetAction::Add),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut changes = Vec::new();
            if let Some(from) = event.paths.first() {
                changes.push((AssetAction::Remove, from.clone()));
            }
            if let Some(to) = event.paths.get(1) {
                changes.push((AssetAction::Add, to.clone()));
            }
            changes
        }
        // Platforms that cannot pair rename events report each side on its
        // own; whether the path still exists tells the two apart.
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                let action = if p.exists() {
                    AssetAction::Add
                } else {
                    AssetAction::Remove
                };
                (action, p.clone())
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => all(AssetAction::Update),
        EventKind::Remove(RemoveKind::Folder) => Vec::new(),
        EventKind::Remove(_) => all(AssetAction::Remove),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher on `root` that forwards every relevant change
/// to the runtime as [`RuntimeEvent::FileChanged`].
pub fn spawn_fs_watcher(
    root: &Path,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> notify::Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    error!("failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                error!("file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(root, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", root);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");
            for (action, path) in changes_from_event(&event) {
                if runtime_tx
                    .send(RuntimeEvent::FileChanged { action, path })
                    .await
                    .is_err()
                {
                    debug!("runtime channel closed; stopping watcher forwarding");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
