// File: fleet-snapshot/src/config/manager.rs
use super::{Config, SnapshotGroupFile};
use anyhow::{anyhow, Result};
use glob::glob;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

use crate::scheduler::driver::validate_6_field_cron;
use crate::schedule::CronSchedule;

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: String) -> Result<Self> {
        let config = Self::load_configuration(&config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &str) -> Result<Config> {
        let main_config_path = format!("{}/main.toml", config_dir);
        let main_config_content = fs::read_to_string(&main_config_path)
            .await
            .map_err(|e| anyhow!("Failed to read main config {}: {}", main_config_path, e))?;

        let mut config: Config = toml::from_str(&main_config_content)
            .map_err(|e| anyhow!("Failed to parse main config: {}", e))?;

        validate_6_field_cron(&config.reconcile_schedule)
            .map_err(|e| anyhow!("Invalid reconcile_schedule '{}': {}", config.reconcile_schedule, e))?;

        // Load snapshot group files
        let pattern = format!("{}/*.toml", config_dir);
        let mut snapshots = BTreeMap::new();
        let mut defined_in: BTreeMap<String, PathBuf> = BTreeMap::new();

        for entry in glob(&pattern).map_err(|e| anyhow!("Glob pattern error: {}", e))? {
            let path = entry.map_err(|e| anyhow!("Glob entry error: {}", e))?;
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| anyhow!("Invalid filename"))?;

            // Skip main.toml as it's already loaded
            if filename == "main.toml" {
                continue;
            }

            debug!("Loading snapshot group: {}", path.display());

            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;

            let group: SnapshotGroupFile = toml::from_str(&content)
                .map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))?;

            for (name, mut spec) in group.snapshots {
                if let Some(previous) = defined_in.get(&name) {
                    return Err(anyhow!(
                        "Snapshot '{}' is defined in both {} and {}",
                        name,
                        previous.display(),
                        path.display()
                    ));
                }

                validate_snapshot_name(&name)
                    .map_err(|e| anyhow!("Invalid snapshot name in {}: {}", path.display(), e))?;

                CronSchedule::parse(&spec.schedule, spec.time_zone.as_deref())
                    .map_err(|e| anyhow!("Snapshot '{}' in {}: {}", name, path.display(), e))?;

                spec.name = name.clone();
                defined_in.insert(name.clone(), path.clone());
                snapshots.insert(name, spec);
            }
        }

        config.snapshots = snapshots;

        info!(
            "Loaded {} snapshots from {} group files",
            config.snapshots.len(),
            defined_in.values().collect::<std::collections::BTreeSet<_>>().len()
        );

        Ok(config)
    }
}

/// Snapshot names become one directory segment under `storage`
pub fn validate_snapshot_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(anyhow!("snapshot name cannot be empty"));
    }
    if name == "." || name == ".." {
        return Err(anyhow!("snapshot name '{}' is reserved", name));
    }
    if let Some(bad) = name.chars().find(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err(anyhow!("snapshot name '{}' contains '{}'", name, bad.escape_default()));
    }
    Ok(())
}
