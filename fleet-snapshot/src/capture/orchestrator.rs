// File: src/capture/orchestrator.rs
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};

use super::writer::ObjectWriter;
use crate::constants::layout::{
    CAPTURE_DIR_FORMAT, COLLISION_SEPARATOR, COLLISION_SUFFIX_WIDTH, MANIFEST_FILE,
    MAX_COLLISION_SUFFIX, REFERENCED_DIR,
};
use crate::errors::{CaptureFailure, SnapshotError};
use crate::fleet::{Category, FleetApi, FleetItem, CAPTURE_CATEGORIES, CATEGORY_SET_VERSION};
use crate::snapshot::SnapshotSpec;

/// Result of a capture that completed without error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureRun {
    pub dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub items_written: usize,
    pub per_category: BTreeMap<Category, usize>,
    pub referenced_written: usize,
}

/// Summary written as `capture.json` into every completed capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureManifest {
    pub snapshot: String,
    pub started_at: DateTime<Utc>,
    pub category_set_version: u32,
    pub categories: BTreeMap<Category, usize>,
    pub referenced_items: usize,
    pub items_written: usize,
}

/// Runs one capture: enumerate every category and persist every item
pub struct CaptureOrchestrator {
    fleet: Arc<dyn FleetApi>,
    writer: ObjectWriter,
}

impl CaptureOrchestrator {
    pub fn new(fleet: Arc<dyn FleetApi>) -> Self {
        Self {
            fleet,
            writer: ObjectWriter::new(),
        }
    }

    /// Capture fleet state for `spec` into a fresh directory named after `started_at`.
    ///
    /// A failing category aborts the remaining ones. The partial directory is
    /// kept and reported in [`CaptureFailure::dir`].
    #[instrument(skip(self, spec), fields(snapshot = %spec.name))]
    pub async fn run_capture(
        &self,
        spec: &SnapshotSpec,
        started_at: DateTime<Utc>,
    ) -> Result<CaptureRun, CaptureFailure> {
        let dir = create_capture_dir(&spec.storage, &spec.name, started_at)
            .await
            .map_err(|e| CaptureFailure::new(None, e))?;

        info!("Capturing fleet state for {} into {}", spec.name, dir.display());

        match self.capture_into(&dir).await {
            Ok((per_category, referenced_written)) => {
                let items_written = per_category.values().sum::<usize>() + referenced_written;
                let manifest = CaptureManifest {
                    snapshot: spec.name.clone(),
                    started_at,
                    category_set_version: CATEGORY_SET_VERSION,
                    categories: per_category.clone(),
                    referenced_items: referenced_written,
                    items_written,
                };
                write_manifest(&dir, &manifest)
                    .await
                    .map_err(|e| CaptureFailure::new(Some(dir.clone()), e))?;

                info!(
                    "✓ Capture for {} completed: {} items in {}",
                    spec.name,
                    items_written,
                    dir.display()
                );

                Ok(CaptureRun {
                    dir,
                    started_at,
                    items_written,
                    per_category,
                    referenced_written,
                })
            }
            Err(e) => {
                error!(
                    "✗ Capture for {} aborted, partial directory kept at {}: {}",
                    spec.name,
                    dir.display(),
                    e
                );
                Err(CaptureFailure::new(Some(dir), e))
            }
        }
    }

    async fn capture_into(&self, dir: &Path) -> Result<(BTreeMap<Category, usize>, usize), SnapshotError> {
        let mut per_category = BTreeMap::new();
        let mut referenced_written = 0;

        for (step, category) in CAPTURE_CATEGORIES.iter().enumerate() {
            let items = match self.fleet.list_category(*category).await {
                Ok(items) => items,
                Err(e) if e.is_not_found() => {
                    debug!("Category {} not served by the fleet, skipping", category);
                    per_category.insert(*category, 0);
                    continue;
                }
                Err(e) => {
                    return Err(SnapshotError::List {
                        category: *category,
                        reason: e.to_string(),
                    })
                }
            };

            let category_dir = dir.join(category.as_str());
            create_dir(&category_dir).await?;

            for item in &items {
                self.writer.write(item, &category_dir).await?;
            }

            if category.follows_references() {
                referenced_written += self.capture_references(&items, dir).await?;
            }

            info!(
                "Step {}/{}: captured {} {}",
                step + 1,
                CAPTURE_CATEGORIES.len(),
                items.len(),
                category
            );
            per_category.insert(*category, items.len());
        }

        Ok((per_category, referenced_written))
    }

    /// Resolve and write every object referenced by `items`. Lookups that fail
    /// are skipped; only write failures abort the capture.
    async fn capture_references(&self, items: &[FleetItem], dir: &Path) -> Result<usize, SnapshotError> {
        let referenced_dir = dir.join(REFERENCED_DIR);
        let mut written = 0;

        for item in items {
            for reference in &item.references {
                let referenced = match self.fleet.get_referenced(reference).await {
                    Ok(referenced) => referenced,
                    Err(e) if e.is_not_found() => {
                        debug!("{} referenced by {} is absent, skipping", reference, item.object_ref());
                        continue;
                    }
                    Err(e) => {
                        warn!("Could not resolve {} referenced by {}: {}", reference, item.object_ref(), e);
                        continue;
                    }
                };

                if written == 0 {
                    create_dir(&referenced_dir).await?;
                }
                self.writer.write(&referenced, &referenced_dir).await?;
                written += 1;
            }
        }

        Ok(written)
    }
}

/// Create `storage/<name>/<timestamp>[-NNN]`, never reusing an existing directory
async fn create_capture_dir(storage: &Path, name: &str, started_at: DateTime<Utc>) -> Result<PathBuf, SnapshotError> {
    let storage_ok = fs::metadata(storage).await.map(|m| m.is_dir()).unwrap_or(false);
    if !storage_ok {
        return Err(SnapshotError::Write {
            path: storage.to_path_buf(),
            reason: "storage path is not an existing directory".to_string(),
        });
    }

    let root = storage.join(name);
    fs::create_dir_all(&root).await.map_err(|e| SnapshotError::Write {
        path: root.clone(),
        reason: e.to_string(),
    })?;

    let base = started_at.format(CAPTURE_DIR_FORMAT).to_string();
    for attempt in 0..=MAX_COLLISION_SUFFIX {
        let dirname = if attempt == 0 {
            base.clone()
        } else {
            format!(
                "{}{}{:0width$}",
                base,
                COLLISION_SEPARATOR,
                attempt,
                width = COLLISION_SUFFIX_WIDTH
            )
        };
        let path = root.join(&dirname);

        match fs::create_dir(&path).await {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("Capture directory {} exists, trying next suffix", dirname);
            }
            Err(e) => {
                return Err(SnapshotError::Write {
                    path,
                    reason: e.to_string(),
                })
            }
        }
    }

    Err(SnapshotError::Write {
        path: root.join(base),
        reason: format!("more than {} captures share this timestamp", MAX_COLLISION_SUFFIX),
    })
}

/// Timestamp embedded in a capture directory name; `None` for foreign entries
pub fn parse_capture_dir_name(dirname: &str) -> Option<DateTime<Utc>> {
    let timestamp = match dirname.split_once(COLLISION_SEPARATOR) {
        Some((timestamp, suffix)) => {
            if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            timestamp
        }
        None => dirname,
    };

    NaiveDateTime::parse_from_str(timestamp, CAPTURE_DIR_FORMAT)
        .ok()
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

async fn create_dir(path: &Path) -> Result<(), SnapshotError> {
    fs::create_dir_all(path).await.map_err(|e| SnapshotError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

async fn write_manifest(dir: &Path, manifest: &CaptureManifest) -> Result<(), SnapshotError> {
    let path = dir.join(MANIFEST_FILE);
    let body = serde_json::to_vec_pretty(manifest).map_err(|e| SnapshotError::Write {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    fs::write(&path, body).await.map_err(|e| SnapshotError::Write {
        path,
        reason: e.to_string(),
    })
}
