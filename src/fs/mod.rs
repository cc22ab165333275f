// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
///
/// Everything the compiler reads or writes goes through this trait so tests
/// can swap in [`mock::MockFileSystem`] and inject failures.
pub trait FileSystem: Send + Sync + Debug {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write `contents` to `path`, creating parent directories and
    /// overwriting any existing file.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Remove a file. A missing file is not an error.
    fn remove_file(&self, path: &Path) -> Result<()>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove everything inside `path`, keeping the directory itself.
    fn clear_dir(&self, path: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        let mut file = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        file.write_all(contents).with_context(|| format!("writing to file {:?}", path))?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing file {:?}", path)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).with_context(|| format!("creating dir {:?}", path))
    }

    fn clear_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        for entry in self.read_dir(path)? {
            if entry.is_dir() {
                fs::remove_dir_all(&entry).with_context(|| format!("removing dir {:?}", entry))?;
            } else {
                fs::remove_file(&entry).with_context(|| format!("removing file {:?}", entry))?;
            }
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}

/// Collect every file below `root`, recursively.
///
/// Returned paths are full paths, sorted so scans are deterministic.
pub fn collect_files(fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn real_fs_write_creates_parents_and_remove_tolerates_missing() {
        let dir = tempdir().unwrap();
        let fs = RealFileSystem;
        let target = dir.path().join("dist/templates/customers/account.liquid");

        fs.write(&target, b"hello").unwrap();
        assert_eq!(fs.read(&target).unwrap(), b"hello");

        fs.remove_file(&target).unwrap();
        assert!(!fs.exists(&target));
        fs.remove_file(&target).unwrap();
    }

    #[test]
    fn clear_dir_keeps_the_directory() {
        let dir = tempdir().unwrap();
        let fs = RealFileSystem;
        fs.write(&dir.path().join("out/a.txt"), b"a").unwrap();
        fs.write(&dir.path().join("out/nested/b.txt"), b"b").unwrap();

        fs.clear_dir(&dir.path().join("out")).unwrap();
        assert!(fs.is_dir(&dir.path().join("out")));
        assert!(fs.read_dir(&dir.path().join("out")).unwrap().is_empty());
    }

    #[test]
    fn collect_files_is_recursive_and_sorted() {
        let dir = tempdir().unwrap();
        let fs = RealFileSystem;
        fs.write(&dir.path().join("b/two.txt"), b"").unwrap();
        fs.write(&dir.path().join("a/one.txt"), b"").unwrap();
        fs.write(&dir.path().join("a/deep/three.txt"), b"").unwrap();

        let files = collect_files(&fs, dir.path()).unwrap();
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, ["a/deep/three.txt", "a/one.txt", "b/two.txt"]);
    }
}
