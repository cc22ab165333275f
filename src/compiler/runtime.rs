// src/compiler/runtime.rs

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::types::AssetAction;
use crate::watch::{WatchBatch, Watcher, relative_str};

use super::Compiler;

/// Events consumed by the watch-mode runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A file under the input directory changed. `path` is absolute.
    FileChanged { action: AssetAction, path: PathBuf },
    /// Finish the current batch, fire `watcherClose` and return.
    ShutdownRequested,
}

/// Cloneable sender into a compiler's runtime loop.
///
/// Events queue up until `watch()` consumes them, so anything sent before a
/// shutdown request is still processed.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    tx: mpsc::Sender<RuntimeEvent>,
}

impl RuntimeHandle {
    pub(crate) fn new(tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self { tx }
    }

    /// Request a graceful shutdown of `watch()`.
    pub async fn close(&self) {
        if self.tx.send(RuntimeEvent::ShutdownRequested).await.is_err() {
            debug!("runtime channel closed before shutdown request");
        }
    }

    /// Report a change as if the file watcher had seen it.
    pub async fn file_changed(&self, action: AssetAction, path: impl Into<PathBuf>) {
        let event = RuntimeEvent::FileChanged {
            action,
            path: path.into(),
        };
        if self.tx.send(event).await.is_err() {
            debug!("runtime channel closed; change dropped");
        }
    }
}

/// Main event loop.
///
/// Each admitted change is compiled to completion before the next event is
/// read, so batches never interleave.
pub(crate) async fn run(
    compiler: &Compiler,
    watcher: &mut Watcher,
    events_rx: &mut mpsc::Receiver<RuntimeEvent>,
) {
    info!("melter runtime started");

    loop {
        let event = match events_rx.recv().await {
            Some(e) => e,
            None => {
                info!("runtime event channel closed; exiting");
                break;
            }
        };

        debug!(?event, "runtime received event");

        match event {
            RuntimeEvent::ShutdownRequested => {
                info!("shutdown requested; stopping runtime");
                break;
            }
            RuntimeEvent::FileChanged { action, path } => {
                if let Some(batch) = admit_change(compiler.fs().as_ref(), watcher, action, &path) {
                    compiler.compile_batch(batch).await;
                }
            }
        }
    }

    info!("runtime exiting");
}

fn admit_change(
    fs: &dyn FileSystem,
    watcher: &mut Watcher,
    action: AssetAction,
    path: &Path,
) -> Option<WatchBatch> {
    let Some(rel) = relative_str(watcher.root(), path) else {
        debug!(?path, "change outside input directory");
        return None;
    };
    // Directories and files already gone again produce no batch.
    if action.is_write() && !fs.is_file(path) {
        debug!(?path, %action, "not a file; skipping");
        return None;
    }
    watcher.batch_for(action, &rel)
}
