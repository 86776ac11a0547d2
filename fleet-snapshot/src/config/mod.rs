// File: fleet-snapshot/src/config/mod.rs
pub mod manager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
pub use manager::ConfigManager;

use crate::constants::defaults;
use crate::snapshot::SnapshotSpec;

/// `config/main.toml` plus every snapshot group file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// 6-field cron (sec min hour day month dow) for the reconcile tick
    #[serde(default = "default_reconcile_schedule")]
    pub reconcile_schedule: String,
    pub fleet_api: FleetApiConfig,
    // Populated from the snapshot group files, keyed by snapshot name
    #[serde(skip)]
    pub snapshots: BTreeMap<String, SnapshotSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetApiConfig {
    pub base_url: String,
    /// Sent as a bearer token when present
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// One `config/<group>.toml` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotGroupFile {
    #[serde(default)]
    pub snapshots: BTreeMap<String, SnapshotSpec>,
}

fn default_database_path() -> String {
    defaults::DATABASE_PATH.to_string()
}

fn default_reconcile_schedule() -> String {
    defaults::RECONCILE_SCHEDULE.to_string()
}

fn default_request_timeout() -> u64 {
    defaults::REQUEST_TIMEOUT_SECONDS
}

impl Config {
    /// Specs in name order
    pub fn snapshot_specs(&self) -> Vec<SnapshotSpec> {
        self.snapshots.values().cloned().collect()
    }

    pub fn snapshot_names(&self) -> Vec<String> {
        self.snapshots.keys().cloned().collect()
    }
}
