//! Error types for the snapshot scheduler
//!
//! Core components (schedule, capture, retention) return [`SnapshotError`].
//! The Fleet API collaborator reports [`FleetApiError`], of which only
//! category enumeration failures ever abort a capture.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

use crate::fleet::Category;

/// Main error type for scheduling, capture and retention
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Cron expression could not be parsed. Fatal, never retried.
    #[error("Invalid schedule '{schedule}': {reason}")]
    InvalidSchedule { schedule: String, reason: String },

    /// Cron expression parses but never fires again
    #[error("Schedule '{schedule}' has no occurrence after {after}")]
    NoFutureOccurrence {
        schedule: String,
        after: DateTime<Utc>,
    },

    /// Enumerating a resource category failed
    #[error("Failed to list category '{category}': {reason}")]
    List { category: Category, reason: String },

    /// Persisting a captured object or directory failed
    #[error("Failed to write '{}': {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    /// One or more capture directories could not be deleted
    #[error("Failed to prune captures of '{snapshot}': {}", failures.join("; "))]
    Prune {
        snapshot: String,
        failures: Vec<String>,
    },

    /// Snapshot is not known to the store
    #[error("Snapshot '{snapshot}' not found")]
    NotFound { snapshot: String },
}

impl SnapshotError {
    /// Errors that come from the snapshot's own configuration rather than the run
    pub fn is_schedule_error(&self) -> bool {
        matches!(
            self,
            SnapshotError::InvalidSchedule { .. } | SnapshotError::NoFutureOccurrence { .. }
        )
    }
}

/// Errors reported by a Fleet API implementation
#[derive(Debug, Error)]
pub enum FleetApiError {
    /// Requested category or object does not exist
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Transport failure or unexpected status
    #[error("Request for {resource} failed: {reason}")]
    Request { resource: String, reason: String },

    /// Response body could not be decoded
    #[error("Invalid response for {resource}: {reason}")]
    InvalidResponse { resource: String, reason: String },
}

impl FleetApiError {
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, FleetApiError::NotFound { .. })
    }
}

/// A capture that stopped before completing.
///
/// `dir` is the partially populated capture directory, when one was created.
/// It is left on disk as evidence of the failed run.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct CaptureFailure {
    pub dir: Option<PathBuf>,
    #[source]
    pub error: SnapshotError,
}

impl CaptureFailure {
    pub fn new(dir: Option<PathBuf>, error: SnapshotError) -> Self {
        Self { dir, error }
    }
}
