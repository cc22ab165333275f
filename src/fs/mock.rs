// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    failing_reads: HashSet<PathBuf>,
    failing_writes: HashSet<PathBuf>,
    failing_removes: HashSet<PathBuf>,
}

/// In-memory filesystem for tests.
///
/// Clones share the same state, so a test can keep a handle while the
/// compiler owns another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

fn parent_of(path: &Path) -> Option<&Path> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Some(Path::new(".")),
        other => other,
    }
}

fn link_child(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    let Some(parent) = parent_of(path) else {
        return;
    };
    if parent == path {
        return;
    }
    ensure_dir_entry(entries, parent);
    if let (Some(MockEntry::Dir(children)), Some(name)) = (
        entries.get_mut(parent),
        path.file_name().and_then(|n| n.to_str()),
    ) {
        if !children.iter().any(|c| c == name) {
            children.push(name.to_string());
        }
    }
}

fn unlink_child(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    if let (Some(parent), Some(name)) = (parent_of(path), path.file_name().and_then(|n| n.to_str()))
    {
        if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
            children.retain(|c| c != name);
        }
    }
}

fn ensure_dir_entry(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    if entries.contains_key(path) {
        return;
    }
    entries.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
    link_child(entries, path);
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        // Ensure root exists
        fs.lock()
            .entries
            .insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));
        fs
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut state = self.lock();
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::File(content.into()));
        link_child(&mut state.entries, path);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        ensure_dir_entry(&mut self.lock().entries, path.as_ref());
    }

    /// Contents of a file, if it exists.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().entries.get(path.as_ref()) {
            Some(MockEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// All file paths currently stored, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .lock()
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, MockEntry::File(_)))
            .map(|(p, _)| p.clone())
            .collect();
        files.sort();
        files
    }

    /// Make every read of `path` fail.
    pub fn fail_reads_of(&self, path: impl AsRef<Path>) {
        self.lock().failing_reads.insert(path.as_ref().to_path_buf());
    }

    /// Make every write to `path` fail.
    pub fn fail_writes_to(&self, path: impl AsRef<Path>) {
        self.lock().failing_writes.insert(path.as_ref().to_path_buf());
    }

    /// Make every removal of `path` fail.
    pub fn fail_removes_of(&self, path: impl AsRef<Path>) {
        self.lock().failing_removes.insert(path.as_ref().to_path_buf());
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let state = self.lock();
        if state.failing_reads.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        match state.entries.get(path) {
            Some(MockEntry::File(content)) => Ok(content.clone()),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        {
            let state = self.lock();
            if state.failing_writes.contains(path) {
                return Err(anyhow!("Read-only file system: {:?}", path));
            }
            if let Some(MockEntry::Dir(_)) = state.entries.get(path) {
                return Err(anyhow!("Is a directory: {:?}", path));
            }
        }
        self.add_file(path, contents);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut state = self.lock();
        if state.failing_removes.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        match state.entries.get(path) {
            Some(MockEntry::File(_)) => {
                state.entries.remove(path);
                unlink_child(&mut state.entries, path);
                Ok(())
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Ok(()),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.lock();
        if let Some(MockEntry::File(_)) = state.entries.get(path) {
            return Err(anyhow!("Not a directory: {:?}", path));
        }
        ensure_dir_entry(&mut state.entries, path);
        Ok(())
    }

    fn clear_dir(&self, path: &Path) -> Result<()> {
        let mut state = self.lock();
        match state.entries.get_mut(path) {
            Some(MockEntry::Dir(children)) => children.clear(),
            Some(MockEntry::File(_)) => return Err(anyhow!("Not a directory: {:?}", path)),
            None => return Ok(()),
        }
        state
            .entries
            .retain(|p, _| p == path || !p.starts_with(path));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().entries.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::Dir(_)))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // In mock, we just return the path as is, assuming absolute paths are used in tests
        Ok(path.to_path_buf())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self.lock().entries.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
