// src/plugins/paths.rs

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::asset::{Asset, AssetPath};
use crate::compilation::Compilation;
use crate::compiler::Compiler;
use crate::emitter::Emitter;
use crate::plugins::Plugin;
use crate::types::AssetType;
use crate::watch::patterns::{PathClassifier, output_filename};

pub const PLUGIN_NAME: &str = "PathsPlugin";

/// Classifies assets and points classified ones at
/// `<output>/<type>/<output filename>`.
#[derive(Debug, Clone)]
pub struct PathsPlugin {
    classifier: Arc<PathClassifier>,
}

impl PathsPlugin {
    pub fn new(classifier: Arc<PathClassifier>) -> Self {
        Self { classifier }
    }
}

impl Plugin for PathsPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn apply(&self, compiler: &Compiler) {
        let Some(output) = compiler.output_dir().map(Path::to_path_buf) else {
            debug!("no output directory; {PLUGIN_NAME} is inert");
            return;
        };

        let classifier = Arc::clone(&self.classifier);
        compiler
            .hooks()
            .compilation
            .tap_sync(PLUGIN_NAME, move |compilation: &mut Compilation| {
                let classifier = Arc::clone(&classifier);
                compilation
                    .hooks
                    .after_add_asset
                    .tap_sync(PLUGIN_NAME, move |asset: &mut Asset| {
                        if let Some(ty) = classifier.classify(&asset.source.relative) {
                            asset.asset_type = ty;
                        }
                        Ok(())
                    });
                Ok(())
            });

        compiler
            .hooks()
            .emitter
            .tap_sync(PLUGIN_NAME, move |emitter: &mut Emitter| {
                let output = output.clone();
                emitter
                    .hooks
                    .before_asset_action
                    .tap_sync(PLUGIN_NAME, move |asset: &mut Asset| {
                        if asset.asset_type.is_classified() {
                            asset.target =
                                Some(target_for(&output, asset.asset_type, &asset.source.relative));
                        }
                        Ok(())
                    });
                Ok(())
            });
    }
}

/// `<output>/<type>/<output filename>`; the `relative` half is relative to
/// `output`.
pub fn target_for(output: &Path, asset_type: AssetType, rel_source: &str) -> AssetPath {
    AssetPath::under(output, format!("{asset_type}/{}", output_filename(rel_source)))
}
