// File: src/status.rs
//
// Status Recorder: the only writer of a snapshot's status fields

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::database::{CaptureRunRecord, Database};
use crate::errors::SnapshotError;
use crate::schedule::CronSchedule;
use crate::snapshot::{RunStatus, Snapshot, SnapshotStatus};

/// How a handled due time ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded {
        due_time: DateTime<Utc>,
        capture_dir: PathBuf,
        items_written: usize,
    },
    Failed {
        due_time: DateTime<Utc>,
        message: String,
        /// Partial directory left behind, if one was created
        capture_dir: Option<PathBuf>,
    },
    Missed { due_time: DateTime<Utc> },
}

impl RunOutcome {
    pub fn due_time(&self) -> DateTime<Utc> {
        match self {
            RunOutcome::Succeeded { due_time, .. }
            | RunOutcome::Failed { due_time, .. }
            | RunOutcome::Missed { due_time } => *due_time,
        }
    }

    pub fn status(&self) -> RunStatus {
        match self {
            RunOutcome::Succeeded { .. } => RunStatus::Succeeded,
            RunOutcome::Failed { .. } => RunStatus::Failed,
            RunOutcome::Missed { .. } => RunStatus::Missed,
        }
    }
}

pub struct StatusRecorder {
    database: Arc<Database>,
}

impl StatusRecorder {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Mark a run as started and open its history row. Returns the row to finish later.
    pub async fn mark_running(
        &self,
        snapshot: &Snapshot,
        due_time: DateTime<Utc>,
        started_at: DateTime<Utc>,
    ) -> Result<CaptureRunRecord> {
        let status = SnapshotStatus {
            last_run_status: Some(RunStatus::Running),
            ..snapshot.status.clone()
        };
        self.database
            .save_status(snapshot.name(), &status)
            .await
            .with_context(|| format!("Failed to mark {} as running", snapshot.name()))?;

        let run = CaptureRunRecord::started(snapshot.name(), due_time, started_at);
        self.database.store_capture_run(&run).await?;

        Ok(run)
    }

    /// Consume the outcome's due time and persist the resulting status.
    ///
    /// `last_run_time` becomes the due time. The next schedule time is the
    /// first grid instant after the due time, or after `now` for a missed run.
    /// If the schedule has no further occurrence, the status is still saved
    /// (without a next time) and the error is returned.
    pub async fn record_outcome(
        &self,
        snapshot: &Snapshot,
        outcome: &RunOutcome,
        now: DateTime<Utc>,
    ) -> Result<SnapshotStatus> {
        let due_time = outcome.due_time();
        let schedule = CronSchedule::for_spec(&snapshot.spec)?;

        let next_after = match outcome {
            RunOutcome::Missed { .. } => now,
            _ => due_time,
        };
        let (next_schedule_time, schedule_error) = match schedule.next_after(next_after) {
            Ok(next) => (Some(next), None),
            Err(e) => (None, Some(e)),
        };

        let status = match outcome {
            RunOutcome::Succeeded { capture_dir, .. } => SnapshotStatus {
                next_schedule_time,
                last_run_time: Some(due_time),
                last_run_status: Some(RunStatus::Succeeded),
                failure_message: None,
                last_capture_dir: Some(capture_dir.clone()),
            },
            RunOutcome::Failed {
                message,
                capture_dir,
                ..
            } => SnapshotStatus {
                next_schedule_time,
                last_run_time: Some(due_time),
                last_run_status: Some(RunStatus::Failed),
                failure_message: Some(message.clone()),
                last_capture_dir: capture_dir
                    .clone()
                    .or_else(|| snapshot.status.last_capture_dir.clone()),
            },
            RunOutcome::Missed { .. } => SnapshotStatus {
                next_schedule_time,
                last_run_time: Some(due_time),
                last_run_status: Some(RunStatus::Missed),
                failure_message: Some(missed_message(due_time, now)),
                last_capture_dir: snapshot.status.last_capture_dir.clone(),
            },
        };

        self.database
            .save_status(snapshot.name(), &status)
            .await
            .with_context(|| format!("Failed to record {} outcome for {}", outcome.status(), snapshot.name()))?;

        match outcome {
            RunOutcome::Succeeded { items_written, .. } => info!(
                "Recorded succeeded run of {} due {} ({} items), next at {:?}",
                snapshot.name(),
                due_time,
                items_written,
                next_schedule_time
            ),
            RunOutcome::Failed { message, .. } => error!(
                "Recorded failed run of {} due {}: {}",
                snapshot.name(),
                due_time,
                message
            ),
            RunOutcome::Missed { .. } => warn!(
                "Recorded missed run of {} due {} (counted as failed execution), next at {:?}",
                snapshot.name(),
                due_time,
                next_schedule_time
            ),
        }

        match schedule_error {
            Some(e) => Err(e.into()),
            None => Ok(status),
        }
    }

    /// Close a history row opened by [`StatusRecorder::mark_running`]
    pub async fn finish_run(
        &self,
        mut run: CaptureRunRecord,
        outcome: &RunOutcome,
        completed_at: DateTime<Utc>,
    ) -> Result<CaptureRunRecord> {
        run.completed_at = Some(completed_at);
        run.status = outcome.status();
        match outcome {
            RunOutcome::Succeeded {
                capture_dir,
                items_written,
                ..
            } => {
                run.capture_dir = Some(capture_dir.to_string_lossy().into_owned());
                run.items_written = Some(i64::try_from(*items_written).unwrap_or(i64::MAX));
            }
            RunOutcome::Failed {
                message,
                capture_dir,
                ..
            } => {
                run.capture_dir = capture_dir.as_ref().map(|p| p.to_string_lossy().into_owned());
                run.error_message = Some(message.clone());
            }
            RunOutcome::Missed { .. } => {}
        }

        self.database.store_capture_run(&run).await?;
        Ok(run)
    }

    /// Store a missed run in the history
    pub async fn record_missed_run(&self, snapshot: &Snapshot, due_time: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        let run = CaptureRunRecord::missed(snapshot.name(), due_time, now);
        self.database.store_capture_run(&run).await
    }

    /// Keep the computed next time visible without touching the last run fields
    pub async fn record_next_schedule(&self, snapshot: &Snapshot, next: DateTime<Utc>) -> Result<()> {
        if snapshot.status.next_schedule_time == Some(next) {
            return Ok(());
        }

        let status = SnapshotStatus {
            next_schedule_time: Some(next),
            ..snapshot.status.clone()
        };
        self.database.save_status(snapshot.name(), &status).await
    }

    /// A schedule that cannot be evaluated. No run is consumed.
    pub async fn record_schedule_error(&self, snapshot: &Snapshot, error: &SnapshotError) -> Result<()> {
        error!("Schedule of {} cannot be evaluated: {}", snapshot.name(), error);

        let status = SnapshotStatus {
            next_schedule_time: None,
            failure_message: Some(error.to_string()),
            ..snapshot.status.clone()
        };
        self.database.save_status(snapshot.name(), &status).await
    }
}

fn missed_message(due_time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format!(
        "missed due time {}: reconciled {}s late, beyond the starting deadline",
        due_time.to_rfc3339(),
        (now - due_time).num_seconds()
    )
}
