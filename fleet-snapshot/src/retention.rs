//! Retention Pruner
//!
//! Keeps at most `limit` capture directories per snapshot, deleting the
//! oldest first. Ordering is (embedded timestamp, directory name), so
//! captures that share a timestamp still delete in a stable order.
//!
//! Only runs after a capture that completed without error. A snapshot that
//! keeps failing therefore never loses its history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::capture::parse_capture_dir_name;
use crate::errors::SnapshotError;
use crate::snapshot::model::capture_root;

/// One capture directory found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureEntry {
    pub dirname: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub kept: usize,
    pub deleted: Vec<PathBuf>,
}

/// Capture directories of a snapshot, oldest first
pub async fn list_captures(snapshot_name: &str, storage_root: &Path) -> Result<Vec<CaptureEntry>, SnapshotError> {
    let root = capture_root(storage_root, snapshot_name);

    let mut entries = match fs::read_dir(&root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(SnapshotError::Prune {
                snapshot: snapshot_name.to_string(),
                failures: vec![format!("cannot list {}: {}", root.display(), e)],
            })
        }
    };

    let list_error = |e: std::io::Error| SnapshotError::Prune {
        snapshot: snapshot_name.to_string(),
        failures: vec![format!("cannot list {}: {}", root.display(), e)],
    };

    let mut captures = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
        let file_type = entry.file_type().await.map_err(list_error)?;
        if !file_type.is_dir() {
            continue;
        }

        let dirname = entry.file_name().to_string_lossy().into_owned();
        match parse_capture_dir_name(&dirname) {
            Some(created_at) => captures.push(CaptureEntry {
                dirname,
                path: entry.path(),
                created_at,
            }),
            None => debug!("Ignoring non-capture entry {}", entry.path().display()),
        }
    }

    captures.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.dirname.cmp(&b.dirname))
    });

    Ok(captures)
}

/// Delete the oldest captures beyond `limit`. `None` keeps everything.
///
/// Every deletion is attempted; failures are collected into one
/// [`SnapshotError::Prune`].
#[instrument(skip(storage_root))]
pub async fn prune(snapshot_name: &str, storage_root: &Path, limit: Option<u32>) -> Result<PruneReport, SnapshotError> {
    let captures = list_captures(snapshot_name, storage_root).await?;

    let Some(limit) = limit else {
        return Ok(PruneReport {
            kept: captures.len(),
            deleted: Vec::new(),
        });
    };
    let limit = limit as usize;

    if captures.len() <= limit {
        debug!(
            "No old captures to prune for {} (have {}, keeping {})",
            snapshot_name,
            captures.len(),
            limit
        );
        return Ok(PruneReport {
            kept: captures.len(),
            deleted: Vec::new(),
        });
    }

    let excess = captures.len() - limit;
    info!(
        "Pruning {} old captures for {} (keeping {} most recent)",
        excess, snapshot_name, limit
    );

    let mut deleted = Vec::with_capacity(excess);
    let mut failures = Vec::new();

    for capture in &captures[..excess] {
        match fs::remove_dir_all(&capture.path).await {
            Ok(()) => {
                info!("Deleted old capture: {}", capture.path.display());
                deleted.push(capture.path.clone());
            }
            Err(e) => {
                warn!("Failed to delete capture {}: {}", capture.path.display(), e);
                failures.push(format!("{}: {}", capture.path.display(), e));
            }
        }
    }

    if !failures.is_empty() {
        return Err(SnapshotError::Prune {
            snapshot: snapshot_name.to_string(),
            failures,
        });
    }

    Ok(PruneReport {
        kept: captures.len() - deleted.len(),
        deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs as stdfs;

    fn seed(root: &Path, dirnames: &[&str]) {
        for dirname in dirnames {
            stdfs::create_dir_all(root.join("fleet").join(dirname)).unwrap();
        }
    }

    fn remaining(root: &Path) -> Vec<String> {
        let mut names: Vec<String> = stdfs::read_dir(root.join("fleet"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    const CAPTURES: [&str; 4] = [
        "20250109T120500.000Z",
        "20250109T120000.000Z",
        "20250109T121500.000Z",
        "20250109T121000.000Z",
    ];

    #[rstest]
    #[case(Some(2), vec!["20250109T121000.000Z", "20250109T121500.000Z"])]
    #[case(Some(3), vec!["20250109T120500.000Z", "20250109T121000.000Z", "20250109T121500.000Z"])]
    #[case(Some(9), vec!["20250109T120000.000Z", "20250109T120500.000Z", "20250109T121000.000Z", "20250109T121500.000Z"])]
    #[case(Some(0), vec![])]
    #[case(None, vec!["20250109T120000.000Z", "20250109T120500.000Z", "20250109T121000.000Z", "20250109T121500.000Z"])]
    #[tokio::test]
    async fn test_prune_keeps_most_recent(#[case] limit: Option<u32>, #[case] expected: Vec<&str>) {
        let storage = tempfile::TempDir::new().unwrap();
        seed(storage.path(), &CAPTURES);

        let report = prune("fleet", storage.path(), limit).await.unwrap();

        assert_eq!(remaining(storage.path()), expected);
        assert_eq!(report.kept, expected.len());
        assert_eq!(report.deleted.len(), CAPTURES.len() - expected.len());
    }

    #[tokio::test]
    async fn test_timestamp_ties_break_on_name() {
        let storage = tempfile::TempDir::new().unwrap();
        seed(
            storage.path(),
            &["20250109T120000.000Z-001", "20250109T120000.000Z", "20250109T120000.000Z-002"],
        );

        prune("fleet", storage.path(), Some(1)).await.unwrap();

        assert_eq!(remaining(storage.path()), vec!["20250109T120000.000Z-002"]);
    }

    #[tokio::test]
    async fn test_foreign_entries_are_left_alone() {
        let storage = tempfile::TempDir::new().unwrap();
        seed(storage.path(), &["20250109T120000.000Z", "20250109T120500.000Z", "notes"]);
        stdfs::write(storage.path().join("fleet").join("README"), "keep").unwrap();

        let report = prune("fleet", storage.path(), Some(1)).await.unwrap();

        assert_eq!(report.deleted.len(), 1);
        assert_eq!(
            remaining(storage.path()),
            vec!["20250109T120500.000Z", "README", "notes"]
        );
    }

    #[tokio::test]
    async fn test_missing_snapshot_root_is_empty() {
        let storage = tempfile::TempDir::new().unwrap();
        let report = prune("never-ran", storage.path(), Some(3)).await.unwrap();
        assert_eq!(report, PruneReport::default());
    }
}
