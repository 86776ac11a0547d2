// File: src/scheduler/driver.rs
use anyhow::{anyhow, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, instrument};

use super::reconciler::{ReconcileResult, SnapshotReconciler};

/// Ticks the reconciler on a 6-field cron schedule
pub struct ReconcileScheduler {
    reconciler: Arc<SnapshotReconciler>,
    scheduler: JobScheduler,
}

impl ReconcileScheduler {
    pub async fn new(reconciler: Arc<SnapshotReconciler>) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        Ok(Self { reconciler, scheduler })
    }

    #[instrument(skip(self))]
    pub async fn start(&self, reconcile_schedule: &str) -> Result<()> {
        validate_6_field_cron(reconcile_schedule)
            .map_err(|e| anyhow!("Invalid 6-field cron schedule '{}': {}", reconcile_schedule, e))?;

        let reconciler = self.reconciler.clone();
        let job = Job::new_async(reconcile_schedule, move |_uuid, _scheduler| {
            let reconciler = reconciler.clone();

            Box::pin(async move {
                let now = Utc::now();
                debug!("Reconcile tick at {}", now);

                let results = reconciler.reconcile_all(now).await;
                let captured = results
                    .iter()
                    .filter(|(_, r)| matches!(r, Ok(ReconcileResult::Captured { .. })))
                    .count();
                if captured > 0 {
                    info!("Reconcile tick captured {} of {} snapshots", captured, results.len());
                }
            })
        })
        .map_err(|e| anyhow!("Failed to create reconcile job for '{}': {}", reconcile_schedule, e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add reconcile job to scheduler: {}", e))?;

        self.scheduler
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start scheduler: {}", e))?;

        info!(
            "✓ Reconcile scheduler started on '{}' for {} snapshots",
            reconcile_schedule,
            self.reconciler.snapshot_names().len()
        );
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<()> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to stop scheduler: {}", e))?;
        info!("Reconcile scheduler stopped");
        Ok(())
    }
}

/// The driver ticks with seconds granularity: sec min hour day month dow
pub fn validate_6_field_cron(schedule: &str) -> Result<()> {
    let parts: Vec<&str> = schedule.split_whitespace().collect();

    if parts.len() != 6 {
        return Err(anyhow!(
            "tokio-cron-scheduler requires exactly 6 fields: second minute hour day month dayofweek. Got {} fields: '{}'",
            parts.len(),
            schedule
        ));
    }

    validate_cron_field(parts[0], "second", 0, 59)?;
    validate_cron_field(parts[1], "minute", 0, 59)?;
    validate_cron_field(parts[2], "hour", 0, 23)?;
    validate_cron_field(parts[3], "day", 1, 31)?;
    validate_cron_field(parts[4], "month", 1, 12)?;
    validate_cron_field(parts[5], "dayofweek", 0, 7)?;

    Ok(())
}

fn validate_cron_field(field: &str, name: &str, min: u32, max: u32) -> Result<()> {
    if field == "*" || field == "?" {
        return Ok(());
    }

    let check = |value: u32| {
        if value < min || value > max {
            Err(anyhow!("{} value {} is outside valid range {}-{}", name, value, min, max))
        } else {
            Ok(())
        }
    };

    if let Some(step) = field.strip_prefix("*/") {
        let step = step
            .parse::<u32>()
            .map_err(|_| anyhow!("Invalid {} step value: {}", name, step))?;
        if step == 0 {
            return Err(anyhow!("{} step value cannot be 0", name));
        }
        return Ok(());
    }

    for part in field.split(',') {
        match part.split_once('-') {
            Some((start, end)) => {
                let start = start
                    .parse::<u32>()
                    .map_err(|_| anyhow!("Invalid {} range start: {}", name, start))?;
                let end = end
                    .parse::<u32>()
                    .map_err(|_| anyhow!("Invalid {} range end: {}", name, end))?;
                check(start)?;
                check(end)?;
            }
            None => {
                let value = part
                    .parse::<u32>()
                    .map_err(|_| anyhow!("Invalid {} value: {}", name, part))?;
                check(value)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("0 * * * * *" ; "every minute")]
    #[test_case("*/15 * * * * *" ; "every fifteen seconds")]
    #[test_case("0 0,30 8-18 * * 1-5" ; "lists and ranges")]
    fn test_valid_driver_schedules(schedule: &str) {
        assert!(validate_6_field_cron(schedule).is_ok());
    }

    #[test_case("* * * * *" ; "five fields")]
    #[test_case("60 * * * * *" ; "second out of range")]
    #[test_case("0 */0 * * * *" ; "zero step")]
    #[test_case("0 0 25 * * *" ; "hour out of range")]
    fn test_invalid_driver_schedules(schedule: &str) {
        assert!(validate_6_field_cron(schedule).is_err());
    }
}
