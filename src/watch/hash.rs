// src/watch/hash.rs

use std::collections::HashMap;

use blake3::Hasher;
use tracing::debug;

/// Compute the hash of a byte buffer.
pub fn compute_content_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    hasher.finalize().to_hex().to_string()
}

/// Last forwarded content hash per source path.
///
/// Used with `use_hash = true` to drop `update` events that did not change
/// the file's bytes (editors often save without changes, or emit several
/// modify events per save).
#[derive(Debug, Default)]
pub struct ContentHashCache {
    hashes: HashMap<String, String>,
}

impl ContentHashCache {
    pub fn new() -> Self {
        Self {
            hashes: HashMap::new(),
        }
    }

    /// Record `contents` for `rel_path` and report whether it differs from
    /// the last recorded value. A path seen for the first time is changed.
    pub fn record(&mut self, rel_path: &str, contents: &[u8]) -> bool {
        let hash = compute_content_hash(contents);
        match self.hashes.insert(rel_path.to_string(), hash.clone()) {
            Some(previous) if previous == hash => {
                debug!(path = rel_path, "content hash unchanged");
                false
            }
            _ => true,
        }
    }

    pub fn forget(&mut self, rel_path: &str) {
        if self.hashes.remove(rel_path).is_some() {
            debug!(path = rel_path, "forgot content hash");
        }
    }

    pub fn get(&self, rel_path: &str) -> Option<&str> {
        self.hashes.get(rel_path).map(String::as_str)
    }
}
