// src/asset.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fs::FileSystem;
use crate::types::{AssetAction, AssetType};

/// Absolute path plus the forward-slash path relative to its base directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetPath {
    pub absolute: PathBuf,
    pub relative: String,
}

impl AssetPath {
    pub fn new(absolute: impl Into<PathBuf>, relative: impl Into<String>) -> Self {
        Self {
            absolute: absolute.into(),
            relative: relative.into(),
        }
    }

    /// `base/relative`, with `relative` kept as given.
    pub fn under(base: &Path, relative: impl Into<String>) -> Self {
        let relative = relative.into();
        Self {
            absolute: base.join(&relative),
            relative,
        }
    }
}

/// One file moving through a compile batch.
///
/// `asset_type` and `target` start empty and are filled in by plugins; an
/// asset without a target is never written or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub asset_type: AssetType,
    pub source: AssetPath,
    pub target: Option<AssetPath>,
    pub content: Vec<u8>,
    /// Source relative paths of associated assets in the same compilation.
    pub links: BTreeSet<String>,
    action: AssetAction,
}

impl Asset {
    /// Build an asset, reading its content eagerly.
    ///
    /// Removals and unreadable sources get empty content.
    pub fn load(source: AssetPath, action: AssetAction, fs: &dyn FileSystem) -> Self {
        let content = if action == AssetAction::Remove {
            Vec::new()
        } else {
            match fs.read(&source.absolute) {
                Ok(bytes) => bytes,
                Err(err) => {
                    debug!(path = %source.relative, "source unreadable, using empty content: {err:#}");
                    Vec::new()
                }
            }
        };
        Self::with_content(source, action, content)
    }

    pub fn with_content(source: AssetPath, action: AssetAction, content: Vec<u8>) -> Self {
        Self {
            asset_type: AssetType::Unclassified,
            source,
            target: None,
            content,
            links: BTreeSet::new(),
            action,
        }
    }

    /// Event kind the asset was created for. Fixed at construction.
    pub fn action(&self) -> AssetAction {
        self.action
    }

    /// Associate this asset with `other`. The link is one-directional; call
    /// it on both sides for a symmetric association.
    pub fn link(&mut self, other: &Asset) {
        if other.source.relative != self.source.relative {
            self.links.insert(other.source.relative.clone());
        }
    }

    pub fn unlink(&mut self, other: &Asset) -> bool {
        self.links.remove(&other.source.relative)
    }

    pub fn is_linked_to(&self, other: &Asset) -> bool {
        self.links.contains(&other.source.relative)
    }

    /// Content as text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}
