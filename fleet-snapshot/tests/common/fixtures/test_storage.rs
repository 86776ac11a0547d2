//! Temporary storage roots for captures

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestStorage {
    temp_dir: TempDir,
}

impl TestStorage {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Sorted directory names under `storage/<snapshot>/`
    pub fn capture_dirs(&self, snapshot: &str) -> Vec<String> {
        let root = self.path().join(snapshot);
        if !root.exists() {
            return Vec::new();
        }

        let mut names: Vec<String> = fs::read_dir(root)
            .unwrap()
            .map(|entry| entry.unwrap())
            .filter(|entry| entry.file_type().unwrap().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Sorted entry names directly under `dir`
    pub fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn capture_path(&self, snapshot: &str, dirname: &str) -> PathBuf {
        self.path().join(snapshot).join(dirname)
    }
}
