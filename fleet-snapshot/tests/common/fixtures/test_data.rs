//! Common test data: fixed instants, snapshot specs and fleet items

use chrono::{DateTime, TimeZone, Utc};
use fleet_snapshot::{Category, FleetItem, ObjectRef, SnapshotSpec};
use serde_json::json;
use std::path::Path;

/// 2025-01-09 at the given UTC wall-clock time
pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 9, h, m, s).unwrap()
}

/// Builder for snapshot specs, defaulting to every five minutes
pub struct SpecBuilder {
    spec: SnapshotSpec,
}

impl SpecBuilder {
    pub fn new(name: &str, storage: &Path) -> Self {
        Self {
            spec: SnapshotSpec {
                name: name.to_string(),
                schedule: "*/5 * * * *".to_string(),
                time_zone: None,
                starting_deadline_seconds: None,
                storage: storage.to_path_buf(),
                successful_snapshot_limit: None,
                suspend: false,
            },
        }
    }

    pub fn schedule(mut self, schedule: &str) -> Self {
        self.spec.schedule = schedule.to_string();
        self
    }

    pub fn deadline(mut self, seconds: u64) -> Self {
        self.spec.starting_deadline_seconds = Some(seconds);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.spec.successful_snapshot_limit = Some(limit);
        self
    }

    pub fn suspended(mut self) -> Self {
        self.spec.suspend = true;
        self
    }

    pub fn build(self) -> SnapshotSpec {
        self.spec
    }
}

pub fn item(kind: &str, namespace: Option<&str>, name: &str) -> FleetItem {
    FleetItem {
        kind: kind.to_string(),
        namespace: namespace.map(str::to_string),
        name: name.to_string(),
        references: Vec::new(),
        payload: json!({ "kind": kind, "metadata": { "name": name, "namespace": namespace } }),
    }
}

pub fn with_references(mut item: FleetItem, references: Vec<ObjectRef>) -> FleetItem {
    item.references = references;
    item
}

/// A small fleet: two clusters, one workload pointing at a config map and a
/// secret, one access grant
pub fn sample_fleet() -> super::FakeFleet {
    let config_map = ObjectRef::new("ConfigMap", Some("apps"), "web-config");
    let secret = ObjectRef::new("Secret", Some("apps"), "web-credentials");

    super::FakeFleet::new()
        .with_items(
            Category::Clusters,
            vec![item("ManagedCluster", None, "east-1"), item("ManagedCluster", None, "west-1")],
        )
        .with_items(
            Category::Workloads,
            vec![with_references(
                item("ManifestWork", Some("east-1"), "web"),
                vec![config_map.clone(), secret.clone()],
            )],
        )
        .with_items(
            Category::AccessGrants,
            vec![item("ManagedServiceAccount", Some("east-1"), "ops")],
        )
        .with_referenced(item("ConfigMap", Some("apps"), "web-config"))
        .with_referenced(item("Secret", Some("apps"), "web-credentials"))
}
