// src/watch/path_utils.rs

//! Path helpers shared by the scanner and the event loop.

use std::path::Path;

fn rel_to_string(rel: &Path) -> Option<String> {
    let s = rel.to_string_lossy().replace('\\', "/");
    if s.is_empty() { None } else { Some(s) }
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Tries a plain prefix strip first, then retries with both sides
/// canonicalized (event paths on macOS may arrive under `/private/var` while
/// the root was given as `/var`). The canonical retry only works while the
/// file exists; for removed files the parent directory is canonicalized
/// instead.
///
/// Returns `None` for `root` itself and for paths outside `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return rel_to_string(rel);
    }

    let root_canon = root.canonicalize().ok()?;
    if let Ok(path_canon) = path.canonicalize() {
        return path_canon
            .strip_prefix(&root_canon)
            .ok()
            .and_then(rel_to_string);
    }

    let parent = path.parent()?.canonicalize().ok()?;
    let name = path.file_name()?;
    parent
        .join(name)
        .strip_prefix(&root_canon)
        .ok()
        .and_then(rel_to_string)
}
