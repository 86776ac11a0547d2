// File: src/scheduler/reconciler.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::capture::{CaptureOrchestrator, CaptureRun};
use crate::capture_tracker::CaptureTracker;
use crate::database::Database;
use crate::fleet::FleetApi;
use crate::retention::{self, PruneReport};
use crate::schedule::{evaluate, ScheduleDecision};
use crate::snapshot::Snapshot;
use crate::status::{RunOutcome, StatusRecorder};

/// What one reconcile pass did for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReconcileResult {
    Suspended,
    /// A capture for this name is still in flight
    Busy,
    NotDue {
        next: DateTime<Utc>,
    },
    Missed {
        due_time: DateTime<Utc>,
        next: Option<DateTime<Utc>>,
    },
    Captured {
        due_time: DateTime<Utc>,
        run: CaptureRun,
        pruned: PruneReport,
    },
    CaptureFailed {
        due_time: DateTime<Utc>,
        message: String,
    },
}

/// Composes schedule evaluation, capture, status recording and pruning
pub struct SnapshotReconciler {
    database: Arc<Database>,
    orchestrator: CaptureOrchestrator,
    recorder: StatusRecorder,
    tracker: CaptureTracker,
    snapshot_names: Vec<String>,
}

impl SnapshotReconciler {
    /// `snapshot_names` are the configured snapshots. Rows left in the
    /// database for names no longer configured are never reconciled.
    pub fn new(database: Arc<Database>, fleet: Arc<dyn FleetApi>, snapshot_names: Vec<String>) -> Self {
        Self {
            recorder: StatusRecorder::new(database.clone()),
            database,
            orchestrator: CaptureOrchestrator::new(fleet),
            tracker: CaptureTracker::new(),
            snapshot_names,
        }
    }

    pub fn tracker(&self) -> &CaptureTracker {
        &self.tracker
    }

    pub fn snapshot_names(&self) -> &[String] {
        &self.snapshot_names
    }

    /// Run one reconcile pass for `snapshot_name` at `now`.
    ///
    /// A failed capture is a successful reconcile (`CaptureFailed`); errors are
    /// reserved for schedule, persistence and pruning problems.
    #[instrument(skip(self), fields(snapshot = %snapshot_name))]
    pub async fn reconcile(&self, snapshot_name: &str, now: DateTime<Utc>) -> Result<ReconcileResult> {
        // The row is read under the guard so it reflects any capture that just finished.
        let _guard = match self.tracker.try_start(snapshot_name) {
            Ok(guard) => guard,
            Err(e) => {
                debug!("{}", e);
                return Ok(ReconcileResult::Busy);
            }
        };

        let snapshot = self.database.require_snapshot(snapshot_name).await?;

        if snapshot.spec.suspend {
            debug!("Snapshot {} is suspended, skipping", snapshot_name);
            return Ok(ReconcileResult::Suspended);
        }

        let decision = match evaluate(&snapshot, now) {
            Ok(decision) => decision,
            Err(e) => {
                if e.is_schedule_error() {
                    self.recorder.record_schedule_error(&snapshot, &e).await?;
                }
                return Err(e.into());
            }
        };

        match decision {
            ScheduleDecision::NotDue { next } => {
                debug!("Snapshot {} not due until {}", snapshot_name, next);
                self.recorder.record_next_schedule(&snapshot, next).await?;
                Ok(ReconcileResult::NotDue { next })
            }
            ScheduleDecision::Missed {
                due_time,
                late_by_seconds,
                ..
            } => {
                warn!(
                    "Snapshot {} missed due time {} ({}s late, deadline {:?}s)",
                    snapshot_name, due_time, late_by_seconds, snapshot.spec.starting_deadline_seconds
                );
                self.recorder.record_missed_run(&snapshot, due_time, now).await?;
                let status = self
                    .recorder
                    .record_outcome(&snapshot, &RunOutcome::Missed { due_time }, now)
                    .await?;
                Ok(ReconcileResult::Missed {
                    due_time,
                    next: status.next_schedule_time,
                })
            }
            ScheduleDecision::Due { due_time } => self.capture_due(&snapshot, due_time, now).await,
        }
    }

    async fn capture_due(
        &self,
        snapshot: &Snapshot,
        due_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ReconcileResult> {
        info!("Snapshot {} due at {}, starting capture", snapshot.name(), due_time);

        let run_record = self.recorder.mark_running(snapshot, due_time, now).await?;

        match self.orchestrator.run_capture(&snapshot.spec, now).await {
            Ok(run) => {
                let outcome = RunOutcome::Succeeded {
                    due_time,
                    capture_dir: run.dir.clone(),
                    items_written: run.items_written,
                };
                self.recorder.finish_run(run_record, &outcome, Utc::now()).await?;
                self.recorder.record_outcome(snapshot, &outcome, now).await?;

                // Succeeded is already recorded; a prune failure does not revert it.
                let pruned = match retention::prune(
                    snapshot.name(),
                    &snapshot.spec.storage,
                    snapshot.spec.successful_snapshot_limit,
                )
                .await
                {
                    Ok(report) => report,
                    Err(e) => {
                        error!("Retention for {} failed after a successful capture: {}", snapshot.name(), e);
                        return Err(e.into());
                    }
                };

                info!(
                    "Snapshot {} captured {} items into {} (pruned {}, kept {})",
                    snapshot.name(),
                    run.items_written,
                    run.dir.display(),
                    pruned.deleted.len(),
                    pruned.kept
                );

                Ok(ReconcileResult::Captured { due_time, run, pruned })
            }
            Err(failure) => {
                let message = failure.to_string();
                let outcome = RunOutcome::Failed {
                    due_time,
                    message: message.clone(),
                    capture_dir: failure.dir.clone(),
                };
                self.recorder.finish_run(run_record, &outcome, Utc::now()).await?;
                self.recorder.record_outcome(snapshot, &outcome, now).await?;

                Ok(ReconcileResult::CaptureFailed { due_time, message })
            }
        }
    }

    /// Reconcile every configured snapshot concurrently
    pub async fn reconcile_all(&self, now: DateTime<Utc>) -> Vec<(String, Result<ReconcileResult>)> {
        let passes = self.snapshot_names.iter().map(|name| async move {
            let result = self.reconcile(name, now).await;
            (name.clone(), result)
        });

        let results = join_all(passes).await;

        for (name, result) in &results {
            match result {
                Ok(ReconcileResult::NotDue { .. }) | Ok(ReconcileResult::Suspended) => {}
                Ok(ReconcileResult::Busy) => info!("Snapshot {} still capturing, skipped this tick", name),
                Ok(_) => {}
                Err(e) => error!("Reconcile of {} failed: {:#}", name, e),
            }
        }

        results
    }
}
