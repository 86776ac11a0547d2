//! Test configuration builder for creating config directories programmatically

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Writes `main.toml` and snapshot group files into a temporary directory
pub struct TestConfigBuilder {
    temp_dir: TempDir,
    main_config: String,
    groups: Vec<(String, String)>,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
            main_config: r#"
database_path = "data/test.db"

[fleet_api]
base_url = "http://127.0.0.1:9"
"#
            .to_string(),
            groups: Vec::new(),
        }
    }

    pub fn with_main_config(mut self, content: &str) -> Self {
        self.main_config = content.to_string();
        self
    }

    /// Add `config/<group>.toml` with raw TOML content
    pub fn with_group(mut self, group: &str, content: &str) -> Self {
        self.groups.push((group.to_string(), content.to_string()));
        self
    }

    /// Write all files and return the directory holding them
    pub fn build(self) -> TestConfigDir {
        let dir = self.temp_dir.path();
        fs::write(dir.join("main.toml"), &self.main_config).expect("Failed to write main.toml");
        for (group, content) in &self.groups {
            fs::write(dir.join(format!("{}.toml", group)), content).expect("Failed to write group file");
        }
        TestConfigDir {
            temp_dir: self.temp_dir,
        }
    }
}

pub struct TestConfigDir {
    temp_dir: TempDir,
}

impl TestConfigDir {
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path_string(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }
}
