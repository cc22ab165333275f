// src/watch/cache.rs

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::types::AssetType;

/// Output slot a source path resolves to: its type plus output filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetIdentity {
    pub asset_type: AssetType,
    pub filename: String,
}

impl AssetIdentity {
    pub fn new(asset_type: AssetType, filename: impl Into<String>) -> Self {
        Self {
            asset_type,
            filename: filename.into(),
        }
    }
}

impl fmt::Display for AssetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.asset_type, self.filename)
    }
}

/// Result of trying to occupy an output slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The slot was free and now belongs to the path.
    Claimed,
    /// The path already owned the slot.
    AlreadyOwned,
    /// Another source path owns the slot.
    Collision { owner: String },
}

/// In-memory map of which source path owns each output slot.
///
/// Lives for one watcher run and is only touched from the runtime loop.
#[derive(Debug, Default)]
pub struct FileIdentityCache {
    owners: HashMap<AssetIdentity, String>,
}

impl FileIdentityCache {
    pub fn new() -> Self {
        Self {
            owners: HashMap::new(),
        }
    }

    pub fn claim(&mut self, identity: AssetIdentity, rel_path: &str) -> Claim {
        match self.owners.get(&identity) {
            Some(owner) if owner == rel_path => Claim::AlreadyOwned,
            Some(owner) => Claim::Collision {
                owner: owner.clone(),
            },
            None => {
                debug!(%identity, path = rel_path, "identity claimed");
                self.owners.insert(identity, rel_path.to_string());
                Claim::Claimed
            }
        }
    }

    /// Free the slot, but only if `rel_path` is its owner.
    pub fn release(&mut self, identity: &AssetIdentity, rel_path: &str) -> bool {
        if self.owner(identity) == Some(rel_path) {
            self.owners.remove(identity);
            debug!(%identity, path = rel_path, "identity released");
            true
        } else {
            false
        }
    }

    pub fn owner(&self, identity: &AssetIdentity) -> Option<&str> {
        self.owners.get(identity).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
