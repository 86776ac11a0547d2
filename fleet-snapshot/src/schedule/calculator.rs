// File: src/schedule/calculator.rs
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::cron::CronSchedule;
use crate::errors::SnapshotError;
use crate::snapshot::Snapshot;

/// Earliest grid instant after an anchor and whether it has been reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextFire {
    pub at: DateTime<Utc>,
    pub due: bool,
}

/// What a reconciliation should do with a snapshot right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ScheduleDecision {
    /// Nothing to do until `next`
    NotDue { next: DateTime<Utc> },
    /// Capture now for `due_time`
    Due { due_time: DateTime<Utc> },
    /// `due_time` passed the starting deadline; skip it and wait for `next`
    Missed {
        due_time: DateTime<Utc>,
        late_by_seconds: i64,
        next: DateTime<Utc>,
    },
}

/// Earliest cron-aligned time strictly after `last_run_or_creation`; due once `<= now`
pub fn next_fire_after(
    schedule: &CronSchedule,
    last_run_or_creation: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<NextFire, SnapshotError> {
    let at = schedule.next_after(last_run_or_creation)?;
    Ok(NextFire { at, due: at <= now })
}

/// Classify a snapshot as not due, due or missed at `now`
pub fn evaluate(snapshot: &Snapshot, now: DateTime<Utc>) -> Result<ScheduleDecision, SnapshotError> {
    let schedule = CronSchedule::for_spec(&snapshot.spec)?;

    let mut fire = next_fire_after(&schedule, snapshot.schedule_anchor(), now)?;
    if let Some(floor) = snapshot.status.next_schedule_time {
        // A floor left by an earlier schedule or zone is not on this grid.
        if floor > fire.at && on_grid(&schedule, floor) {
            fire = NextFire {
                at: floor,
                due: floor <= now,
            };
        }
    }

    if !fire.due {
        return Ok(ScheduleDecision::NotDue { next: fire.at });
    }

    let due_time = fire.at;
    let late_by = now - due_time;

    if let Some(deadline) = starting_deadline(snapshot) {
        if late_by > deadline {
            let next = schedule.next_after(now)?;
            return Ok(ScheduleDecision::Missed {
                due_time,
                late_by_seconds: late_by.num_seconds(),
                next,
            });
        }
    }

    Ok(ScheduleDecision::Due { due_time })
}

fn on_grid(schedule: &CronSchedule, instant: DateTime<Utc>) -> bool {
    schedule
        .next_after(instant - Duration::seconds(1))
        .map(|next| next == instant)
        .unwrap_or(false)
}

fn starting_deadline(snapshot: &Snapshot) -> Option<Duration> {
    // Deadlines too large for chrono behave as "no deadline".
    snapshot
        .spec
        .starting_deadline_seconds
        .and_then(|seconds| i64::try_from(seconds).ok())
        .and_then(Duration::try_seconds)
}
