// src/plugins/replace.rs

use serde::Deserialize;
use tracing::debug;

use crate::asset::Asset;
use crate::compiler::Compiler;
use crate::config::PluginSpec;
use crate::emitter::Emitter;
use crate::plugins::Plugin;
use crate::types::AssetType;

pub const PLUGIN_NAME: &str = "replace";

/// Replaces the first occurrence of `from` with `to` in text assets right
/// before they are written.
///
/// ```toml
/// [[plugins]]
/// name = "replace"
/// from = "Hello"
/// to = "Hi"
/// types = ["sections", "snippets"]   # optional
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplacePlugin {
    from: String,
    to: String,
    #[serde(default)]
    types: Option<Vec<AssetType>>,
}

impl ReplacePlugin {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            types: None,
        }
    }

    /// Only touch assets of these types.
    pub fn only_types(mut self, types: impl IntoIterator<Item = AssetType>) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    /// Registry factory.
    pub fn from_spec(spec: &PluginSpec) -> Result<Box<dyn Plugin>, Vec<String>> {
        let plugin: ReplacePlugin = toml::Value::Table(spec.options.clone())
            .try_into()
            .map_err(|e: toml::de::Error| vec![e.to_string().trim().to_string()])?;
        if plugin.from.is_empty() {
            return Err(vec!["`from` must not be empty".to_string()]);
        }
        Ok(Box::new(plugin))
    }

    fn applies_to(&self, asset: &Asset) -> bool {
        self.types
            .as_ref()
            .is_none_or(|types| types.contains(&asset.asset_type))
    }

    /// Rewrite `asset` in place; returns whether anything changed.
    pub fn rewrite(&self, asset: &mut Asset) -> bool {
        if !self.applies_to(asset) || !asset.action().is_write() {
            return false;
        }
        let Some(text) = asset.text() else {
            return false;
        };
        if !text.contains(&self.from) {
            return false;
        }
        let replaced = text.replacen(&self.from, &self.to, 1);
        asset.content = replaced.into_bytes();
        debug!(path = %asset.source.relative, from = %self.from, to = %self.to, "replaced content");
        true
    }
}

impl Plugin for ReplacePlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn apply(&self, compiler: &Compiler) {
        let plugin = self.clone();
        compiler
            .hooks()
            .emitter
            .tap_sync(PLUGIN_NAME, move |emitter: &mut Emitter| {
                let plugin = plugin.clone();
                emitter
                    .hooks
                    .before_asset_action
                    .tap_sync(PLUGIN_NAME, move |asset: &mut Asset| {
                        plugin.rewrite(asset);
                        Ok(())
                    });
                Ok(())
            });
    }
}
