use std::sync::{Arc, Mutex};

use melter::asset::Asset;
use melter::compilation::Compilation;
use melter::compiler::Compiler;
use melter::emitter::Emitter;
use melter::plugins::Plugin;

/// Shared, ordered log of hook invocations.
#[derive(Debug, Clone, Default)]
pub struct HookLog(Arc<Mutex<Vec<String>>>);

impl HookLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }

    /// Entries without a per-asset suffix, i.e. compiler-level hooks only.
    pub fn phases(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| !e.contains(':'))
            .collect()
    }
}

/// Plugin that records every hook it sees.
///
/// Per-asset hooks are logged as `<hook>:<source relative path>`.
pub struct RecordingPlugin {
    log: HookLog,
}

impl RecordingPlugin {
    pub fn new(log: HookLog) -> Self {
        Self { log }
    }
}

fn record_asset(
    log: HookLog,
    hook: &'static str,
) -> impl Fn(&mut Asset) -> anyhow::Result<()> + Send + Sync + 'static {
    move |asset: &mut Asset| {
        log.push(format!("{hook}:{}", asset.source.relative));
        Ok(())
    }
}

impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        "RecordingPlugin"
    }

    fn apply(&self, compiler: &Compiler) {
        let hooks = compiler.hooks();

        for hook in [&hooks.before_compile, &hooks.watcher_start, &hooks.watcher_close] {
            let log = self.log.clone();
            let name = hook.name();
            hook.tap_sync("RecordingPlugin", move |_| {
                log.push(name);
                Ok(())
            });
        }

        for hook in [&hooks.after_compile, &hooks.before_emit, &hooks.after_emit] {
            let log = self.log.clone();
            let name = hook.name();
            hook.tap_sync("RecordingPlugin", move |_: &mut Compilation| {
                log.push(name);
                Ok(())
            });
        }

        let log = self.log.clone();
        hooks
            .compilation
            .tap_sync("RecordingPlugin", move |compilation: &mut Compilation| {
                log.push("compilation");
                compilation
                    .hooks
                    .before_add_asset
                    .tap_sync("RecordingPlugin", record_asset(log.clone(), "beforeAddAsset"));
                compilation
                    .hooks
                    .after_add_asset
                    .tap_sync("RecordingPlugin", record_asset(log.clone(), "afterAddAsset"));
                Ok(())
            });

        let log = self.log.clone();
        hooks
            .emitter
            .tap_sync("RecordingPlugin", move |emitter: &mut Emitter| {
                log.push("emitter");
                emitter
                    .hooks
                    .before_asset_action
                    .tap_sync("RecordingPlugin", record_asset(log.clone(), "beforeAssetAction"));
                emitter
                    .hooks
                    .after_asset_action
                    .tap_sync("RecordingPlugin", record_asset(log.clone(), "afterAssetAction"));
                Ok(())
            });

        let log = self.log.clone();
        hooks.done.tap_sync("RecordingPlugin", move |_| {
            log.push("done");
            Ok(())
        });
    }
}
