// src/watch/mod.rs

//! File discovery, classification and change admission.
//!
//! - [`patterns`]: the ordered regex classifier and output filename rule.
//! - [`cache`]: which source path owns each `(type, filename)` output slot.
//! - [`watcher`]: initial scan, per-event admission and the `notify` bridge.

pub mod cache;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use cache::{AssetIdentity, Claim, FileIdentityCache};
pub use hash::{ContentHashCache, compute_content_hash};
pub use path_utils::relative_str;
pub use patterns::{
    PathClassifier, PathPatterns, build_ignore_set, default_path_patterns, merge_path_patterns,
    normalize_path, output_filename,
};
pub use watcher::{Admission, WatchBatch, Watcher, WatcherHandle, changes_from_event, spawn_fs_watcher};
