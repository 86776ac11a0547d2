// File: src/snapshot/model.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// User-owned definition of a snapshot schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSpec {
    /// Injected from the config table key
    #[serde(skip)]
    pub name: String,
    /// 5-field cron expression (minute granularity)
    pub schedule: String,
    /// IANA zone the cron fields are evaluated in; UTC when absent
    #[serde(default)]
    pub time_zone: Option<String>,
    /// Maximum lateness before a due run is classified missed
    #[serde(default)]
    pub starting_deadline_seconds: Option<u64>,
    /// Existing directory; captures land in `storage/<name>/`
    pub storage: PathBuf,
    /// Maximum number of capture directories kept
    #[serde(default)]
    pub successful_snapshot_limit: Option<u32>,
    #[serde(default)]
    pub suspend: bool,
}

impl SnapshotSpec {
    /// `storage/<name>`, the root of all captures of this snapshot
    pub fn capture_root(&self) -> PathBuf {
        capture_root(&self.storage, &self.name)
    }
}

pub fn capture_root(storage: &Path, name: &str) -> PathBuf {
    storage.join(name)
}

/// Outcome of the most recent run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
    /// Due time passed the starting deadline; no capture was attempted
    Missed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
            RunStatus::Missed => "missed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "succeeded" => Ok(RunStatus::Succeeded),
            "failed" => Ok(RunStatus::Failed),
            "missed" => Ok(RunStatus::Missed),
            other => Err(anyhow::anyhow!("Unknown run status: {}", other)),
        }
    }
}

/// Scheduler-owned status. Never edited by users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStatus {
    pub next_schedule_time: Option<DateTime<Utc>>,
    /// Due time of the last handled run, not its completion time
    pub last_run_time: Option<DateTime<Utc>>,
    pub last_run_status: Option<RunStatus>,
    /// Present only while the last run failed
    pub failure_message: Option<String>,
    pub last_capture_dir: Option<PathBuf>,
}

/// A snapshot definition together with its status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub spec: SnapshotSpec,
    pub status: SnapshotStatus,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(spec: SnapshotSpec, created_at: DateTime<Utc>) -> Self {
        Self {
            spec,
            status: SnapshotStatus::default(),
            created_at,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Reference point for the next due time
    pub fn schedule_anchor(&self) -> DateTime<Utc> {
        self.status.last_run_time.unwrap_or(self.created_at)
    }
}
