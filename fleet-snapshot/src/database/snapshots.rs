//! Snapshot definition and status operations.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::path::PathBuf;
use tracing::{debug, info};

use super::Database;
use crate::errors::SnapshotError;
use crate::snapshot::{RunStatus, Snapshot, SnapshotSpec, SnapshotStatus};

const SNAPSHOT_COLUMNS: &str = r#"
    name, schedule, time_zone, starting_deadline_seconds, storage,
    successful_snapshot_limit, suspend, created_at, next_schedule_time,
    last_run_time, last_run_status, failure_message, last_capture_dir
"#;

impl Database {
    /// Upsert configured definitions. Status and `created_at` of existing rows are kept,
    /// except `next_schedule_time`, which is cleared when the schedule or time zone changes.
    pub async fn sync_definitions(&self, specs: &[SnapshotSpec], now: DateTime<Utc>) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        for spec in specs {
            sqlx::query(
                r#"
                INSERT INTO snapshots (
                    name, schedule, time_zone, starting_deadline_seconds, storage,
                    successful_snapshot_limit, suspend, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    next_schedule_time = CASE
                        WHEN snapshots.schedule IS excluded.schedule
                         AND snapshots.time_zone IS excluded.time_zone
                        THEN snapshots.next_schedule_time
                        ELSE NULL
                    END,
                    schedule = excluded.schedule,
                    time_zone = excluded.time_zone,
                    starting_deadline_seconds = excluded.starting_deadline_seconds,
                    storage = excluded.storage,
                    successful_snapshot_limit = excluded.successful_snapshot_limit,
                    suspend = excluded.suspend,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&spec.name)
            .bind(&spec.schedule)
            .bind(&spec.time_zone)
            .bind(spec.starting_deadline_seconds.map(|s| i64::try_from(s).unwrap_or(i64::MAX)))
            .bind(spec.storage.to_string_lossy().into_owned())
            .bind(spec.successful_snapshot_limit.map(i64::from))
            .bind(spec.suspend)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            debug!("Synced snapshot definition: {}", spec.name);
        }

        tx.commit().await?;
        info!("Synced {} snapshot definitions", specs.len());
        Ok(specs.len())
    }

    pub async fn get_snapshot(&self, name: &str) -> Result<Option<Snapshot>> {
        let row = sqlx::query(&format!("SELECT {} FROM snapshots WHERE name = ?", SNAPSHOT_COLUMNS))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| snapshot_from_row(&row)).transpose()
    }

    /// Like [`Database::get_snapshot`] but a missing snapshot is an error
    pub async fn require_snapshot(&self, name: &str) -> Result<Snapshot> {
        self.get_snapshot(name).await?.ok_or_else(|| {
            SnapshotError::NotFound {
                snapshot: name.to_string(),
            }
            .into()
        })
    }

    pub async fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        let rows = sqlx::query(&format!("SELECT {} FROM snapshots ORDER BY name ASC", SNAPSHOT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(snapshot_from_row).collect()
    }

    /// Replace the scheduler-owned status of one snapshot
    pub async fn save_status(&self, name: &str, status: &SnapshotStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE snapshots
            SET next_schedule_time = ?,
                last_run_time = ?,
                last_run_status = ?,
                failure_message = ?,
                last_capture_dir = ?,
                updated_at = ?
            WHERE name = ?
            "#,
        )
        .bind(status.next_schedule_time)
        .bind(status.last_run_time)
        .bind(status.last_run_status.map(|s| s.as_str()))
        .bind(&status.failure_message)
        .bind(
            status
                .last_capture_dir
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        )
        .bind(Utc::now())
        .bind(name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SnapshotError::NotFound {
                snapshot: name.to_string(),
            }
            .into());
        }

        debug!("Saved status for {}: {:?}", name, status.last_run_status);
        Ok(())
    }
}

fn snapshot_from_row(row: &SqliteRow) -> Result<Snapshot> {
    let starting_deadline: Option<i64> = row.try_get("starting_deadline_seconds")?;
    let limit: Option<i64> = row.try_get("successful_snapshot_limit")?;
    let storage: String = row.try_get("storage")?;
    let last_run_status: Option<String> = row.try_get("last_run_status")?;
    let last_capture_dir: Option<String> = row.try_get("last_capture_dir")?;

    let spec = SnapshotSpec {
        name: row.try_get("name")?,
        schedule: row.try_get("schedule")?,
        time_zone: row.try_get("time_zone")?,
        starting_deadline_seconds: starting_deadline
            .map(u64::try_from)
            .transpose()
            .map_err(|_| anyhow!("negative starting_deadline_seconds in database"))?,
        storage: PathBuf::from(storage),
        successful_snapshot_limit: limit
            .map(u32::try_from)
            .transpose()
            .map_err(|_| anyhow!("successful_snapshot_limit out of range in database"))?,
        suspend: row.try_get("suspend")?,
    };

    let status = SnapshotStatus {
        next_schedule_time: row.try_get("next_schedule_time")?,
        last_run_time: row.try_get("last_run_time")?,
        last_run_status: last_run_status
            .as_deref()
            .map(str::parse::<RunStatus>)
            .transpose()?,
        failure_message: row.try_get("failure_message")?,
        last_capture_dir: last_capture_dir.map(PathBuf::from),
    };

    Ok(Snapshot {
        spec,
        status,
        created_at: row.try_get("created_at")?,
    })
}
