//! Database record types (entities).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::snapshot::RunStatus;

/// Rows reset by [`Database::recover_interrupted_runs`](super::Database::recover_interrupted_runs)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecoveredRuns {
    /// Snapshots whose status was left `running`
    pub snapshots: u64,
    /// History rows left `running`
    pub runs: u64,
}

impl RecoveredRuns {
    pub fn is_empty(&self) -> bool {
        self.snapshots == 0 && self.runs == 0
    }
}

/// One row of the capture run history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRunRecord {
    pub id: String,
    pub snapshot_name: String,
    pub due_time: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub capture_dir: Option<String>,
    pub items_written: Option<i64>,
    pub error_message: Option<String>,
}

impl CaptureRunRecord {
    /// A fresh `running` record
    pub fn started(snapshot_name: &str, due_time: DateTime<Utc>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            snapshot_name: snapshot_name.to_string(),
            due_time,
            started_at,
            completed_at: None,
            status: RunStatus::Running,
            capture_dir: None,
            items_written: None,
            error_message: None,
        }
    }

    /// A missed run: nothing was started, so it completes immediately
    pub fn missed(snapshot_name: &str, due_time: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            completed_at: Some(now),
            status: RunStatus::Missed,
            error_message: Some(format!("due time {} passed the starting deadline", due_time.to_rfc3339())),
            ..Self::started(snapshot_name, due_time, now)
        }
    }
}
