//! Database layer for the snapshot scheduler.
//!
//! This module provides SQLite persistence for:
//! - Snapshot entities (definition synced from config + scheduler-owned status)
//! - Capture runs (history of every attempted, failed or missed run)
//!
//! The module is organized into submodules:
//! - `records` - Row types for the run history
//! - `snapshots` - Snapshot definition and status operations
//! - `runs` - Capture run history operations

mod records;
mod runs;
mod snapshots;

pub use records::*;

use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, error, info, warn};

use crate::constants::runs::INTERRUPTED_MESSAGE;

pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Expose pool for integration test queries
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn new(database_path: &str) -> Result<Self> {
        info!("Opening database at {}", database_path);

        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    error!("Failed to create database directory {:?}: {}", parent, e);
                    return Err(e.into());
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", database_path))?
            .create_if_missing(true);

        let pool = match SqlitePoolOptions::new().connect_with(options).await {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to connect to database {}: {}", database_path, e);
                return Err(e.into());
            }
        };

        Self::from_pool(pool).await
    }

    /// Private in-memory database; a single connection keeps it alive
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: Pool<Sqlite>) -> Result<Self> {
        let database = Self { pool };

        if let Err(e) = database.initialize_tables().await {
            error!("CRITICAL: Database table initialization failed: {}", e);
            return Err(e);
        }
        debug!("Database tables initialized");

        Ok(database)
    }

    async fn initialize_tables(&self) -> Result<()> {
        let snapshots_table_sql = r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                name TEXT PRIMARY KEY,
                schedule TEXT NOT NULL,
                time_zone TEXT,
                starting_deadline_seconds INTEGER,
                storage TEXT NOT NULL,
                successful_snapshot_limit INTEGER,
                suspend BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                next_schedule_time DATETIME,
                last_run_time DATETIME,
                last_run_status TEXT,
                failure_message TEXT,
                last_capture_dir TEXT
            )
        "#;

        if let Err(e) = sqlx::query(snapshots_table_sql).execute(&self.pool).await {
            error!("Failed to create snapshots table: {}", e);
            return Err(e.into());
        }

        let runs_table_sql = r#"
            CREATE TABLE IF NOT EXISTS capture_runs (
                id TEXT PRIMARY KEY,
                snapshot_name TEXT NOT NULL,
                due_time DATETIME NOT NULL,
                started_at DATETIME NOT NULL,
                completed_at DATETIME,
                status TEXT NOT NULL,
                capture_dir TEXT,
                items_written INTEGER,
                error_message TEXT
            )
        "#;

        if let Err(e) = sqlx::query(runs_table_sql).execute(&self.pool).await {
            error!("Failed to create capture_runs table: {}", e);
            return Err(e.into());
        }

        let runs_index_sql = "CREATE INDEX IF NOT EXISTS idx_capture_runs_snapshot ON capture_runs(snapshot_name, started_at DESC)";
        if let Err(e) = sqlx::query(runs_index_sql).execute(&self.pool).await {
            error!("Failed to create capture_runs index: {}", e);
            return Err(e.into());
        }

        Ok(())
    }

    /// Mark runs left `running` by a previous process as failed.
    ///
    /// `last_run_time` is left alone, so the interrupted due time is attempted again.
    pub async fn recover_interrupted_runs(&self) -> Result<RecoveredRuns> {
        let now = Utc::now();

        let runs = sqlx::query(
            r#"
            UPDATE capture_runs
            SET status = 'failed', completed_at = ?, error_message = ?
            WHERE status = 'running'
            "#,
        )
        .bind(now)
        .bind(INTERRUPTED_MESSAGE)
        .execute(&self.pool)
        .await?;

        let snapshots = sqlx::query(
            r#"
            UPDATE snapshots
            SET last_run_status = 'failed', failure_message = ?, updated_at = ?
            WHERE last_run_status = 'running'
            "#,
        )
        .bind(INTERRUPTED_MESSAGE)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let recovered = RecoveredRuns {
            snapshots: snapshots.rows_affected(),
            runs: runs.rows_affected(),
        };
        if !recovered.is_empty() {
            warn!(
                "Recovered {} interrupted captures ({} run records) from a previous process",
                recovered.snapshots, recovered.runs
            );
        } else {
            debug!("No interrupted captures found");
        }

        Ok(recovered)
    }
}
