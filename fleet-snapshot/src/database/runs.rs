//! Capture run history operations.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, error};

use super::records::CaptureRunRecord;
use super::Database;
use crate::snapshot::RunStatus;

impl Database {
    pub async fn store_capture_run(&self, run: &CaptureRunRecord) -> Result<()> {
        debug!("Storing capture run: {} ({})", run.id, run.status);

        match sqlx::query(
            r#"
            INSERT OR REPLACE INTO capture_runs (
                id, snapshot_name, due_time, started_at, completed_at,
                status, capture_dir, items_written, error_message
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&run.id)
        .bind(&run.snapshot_name)
        .bind(run.due_time)
        .bind(run.started_at)
        .bind(run.completed_at)
        .bind(run.status.as_str())
        .bind(&run.capture_dir)
        .bind(run.items_written)
        .bind(&run.error_message)
        .execute(&self.pool)
        .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to store capture run {}: {}", run.id, e);
                Err(e.into())
            }
        }
    }

    pub async fn get_capture_run(&self, id: &str) -> Result<Option<CaptureRunRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, snapshot_name, due_time, started_at, completed_at,
                   status, capture_dir, items_written, error_message
            FROM capture_runs
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| run_from_row(&row)).transpose()
    }

    /// Most recent runs of one snapshot, newest first
    pub async fn list_capture_runs(&self, snapshot_name: &str, limit: i64) -> Result<Vec<CaptureRunRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, snapshot_name, due_time, started_at, completed_at,
                   status, capture_dir, items_written, error_message
            FROM capture_runs
            WHERE snapshot_name = ?
            ORDER BY started_at DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(snapshot_name)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(run_from_row).collect()
    }

    /// Failed executions of a snapshot; missed runs count as failed
    pub async fn count_failed_runs(&self, snapshot_name: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM capture_runs WHERE snapshot_name = ? AND status IN ('failed', 'missed')",
        )
        .bind(snapshot_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

fn run_from_row(row: &SqliteRow) -> Result<CaptureRunRecord> {
    let status: String = row.try_get("status")?;

    Ok(CaptureRunRecord {
        id: row.try_get("id")?,
        snapshot_name: row.try_get("snapshot_name")?,
        due_time: row.try_get("due_time")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        status: status.parse::<RunStatus>()?,
        capture_dir: row.try_get("capture_dir")?,
        items_written: row.try_get("items_written")?,
        error_message: row.try_get("error_message")?,
    })
}
