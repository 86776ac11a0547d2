pub mod capture;
pub mod capture_tracker;
pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod fleet;
pub mod retention;
pub mod schedule;
pub mod scheduler;
pub mod snapshot;
pub mod status;

// Re-export commonly used types
pub use capture::{CaptureOrchestrator, CaptureRun, ObjectWriter};
pub use capture_tracker::{CaptureGuard, CaptureTracker};
pub use config::{Config, ConfigManager, FleetApiConfig};
pub use database::Database;
pub use errors::{CaptureFailure, FleetApiError, SnapshotError};
pub use fleet::{Category, FleetApi, FleetItem, HttpFleetClient, ObjectRef};
pub use retention::{prune, PruneReport};
pub use schedule::{next_fire_after, CronSchedule, ScheduleDecision};
pub use scheduler::{ReconcileResult, ReconcileScheduler, SnapshotReconciler};
pub use snapshot::{RunStatus, Snapshot, SnapshotSpec, SnapshotStatus};
pub use status::{RunOutcome, StatusRecorder};
