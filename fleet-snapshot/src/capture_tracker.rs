//! In-flight capture tracking
//!
//! At most one capture runs per snapshot name. A second reconcile pass that
//! finds the name busy backs off instead of starting a parallel capture.
//!
//! ```ignore
//! let _guard = tracker.try_start("fleet")?;
//! // capture...
//! // dropping the guard releases "fleet", also when the future is cancelled
//! ```

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct ActiveCapture {
    pub snapshot_name: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct CaptureTracker {
    active: Arc<Mutex<HashMap<String, ActiveCapture>>>, // snapshot_name -> capture
}

impl CaptureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `snapshot_name`. Fails while another guard for it is alive.
    pub fn try_start(&self, snapshot_name: &str) -> Result<CaptureGuard> {
        let mut active = self.lock();

        if let Some(current) = active.get(snapshot_name) {
            let running_for = Utc::now().signed_duration_since(current.started_at);
            return Err(anyhow!(
                "Snapshot {} already has a capture in flight (started {}s ago)",
                snapshot_name,
                running_for.num_seconds()
            ));
        }

        active.insert(
            snapshot_name.to_string(),
            ActiveCapture {
                snapshot_name: snapshot_name.to_string(),
                started_at: Utc::now(),
            },
        );
        debug!("Claimed capture slot for {}", snapshot_name);

        Ok(CaptureGuard {
            tracker: self.clone(),
            snapshot_name: snapshot_name.to_string(),
        })
    }

    pub fn is_busy(&self, snapshot_name: &str) -> bool {
        self.lock().contains_key(snapshot_name)
    }

    pub fn active_captures(&self) -> Vec<ActiveCapture> {
        let mut captures: Vec<ActiveCapture> = self.lock().values().cloned().collect();
        captures.sort_by(|a, b| a.snapshot_name.cmp(&b.snapshot_name));
        captures
    }

    fn release(&self, snapshot_name: &str) {
        if let Some(capture) = self.lock().remove(snapshot_name) {
            let duration = Utc::now().signed_duration_since(capture.started_at);
            info!(
                "Released capture slot for {} (held {}ms)",
                snapshot_name,
                duration.num_milliseconds()
            );
        }
    }

    // The map stays consistent even if a holder panicked, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, ActiveCapture>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases its snapshot name on drop
#[must_use = "the snapshot is released as soon as the guard is dropped"]
pub struct CaptureGuard {
    tracker: CaptureTracker,
    snapshot_name: String,
}

impl CaptureGuard {
    pub fn snapshot_name(&self) -> &str {
        &self.snapshot_name
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.tracker.release(&self.snapshot_name);
    }
}
