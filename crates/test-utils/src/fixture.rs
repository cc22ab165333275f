use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::builders::CompilerConfigBuilder;

/// A theme checkout in a temp directory: sources under `src/`, output in
/// `dist/`.
pub struct ThemeFixture {
    dir: TempDir,
}

impl ThemeFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(dir.path().join("src")).expect("create src dir");
        Self { dir }
    }

    /// Header section, customer account template, a stylesheet and a README.
    pub fn standard() -> Self {
        let theme = Self::new();
        theme.write("sections/header.liquid", "<header>Hello, world</header>");
        theme.write("templates/customers/account.liquid", "{{ customer.name }}");
        theme.write("assets/theme.css", "body { margin: 0 }");
        theme.write("README.md", "# theme");
        theme
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn input(&self) -> PathBuf {
        self.dir.path().join("src")
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("dist")
    }

    /// Config pointing at this fixture.
    pub fn config(&self) -> CompilerConfigBuilder {
        CompilerConfigBuilder::new(self.input(), self.output())
    }

    /// Write a source file, creating parent directories. Returns its path.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.input().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create source dir");
        }
        fs::write(&path, contents).expect("write source file");
        path
    }

    pub fn remove(&self, rel: &str) -> PathBuf {
        let path = self.input().join(rel);
        fs::remove_file(&path).expect("remove source file");
        path
    }

    /// Bytes of `dist/<rel>`, if present.
    pub fn read_output(&self, rel: &str) -> Option<Vec<u8>> {
        fs::read(self.output().join(rel)).ok()
    }

    pub fn output_exists(&self, rel: &str) -> bool {
        self.output().join(rel).exists()
    }

    /// All files under `dist/`, relative, sorted, forward slashes.
    pub fn output_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        let mut stack = vec![self.output()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if let Ok(rel) = path.strip_prefix(self.output()) {
                    files.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        files.sort();
        files
    }
}

impl Default for ThemeFixture {
    fn default() -> Self {
        Self::new()
    }
}
