//! Reconciliation of snapshot schedules
//!
//! One reconcile pass per snapshot name evaluates the schedule and, when a run
//! is due, captures, records the outcome and prunes old captures, in that order.
//! The pass holds the snapshot's [`CaptureGuard`](crate::capture_tracker::CaptureGuard)
//! throughout, so capture and pruning of one snapshot never overlap.
//!
//! [`ReconcileScheduler`] drives passes for all configured snapshots on a
//! 6-field cron tick (sec min hour day month dow):
//!
//! ```toml
//! # config/main.toml
//! reconcile_schedule = "0 * * * * *"  # every minute
//! ```

pub mod driver;
pub mod reconciler;

pub use driver::ReconcileScheduler;
pub use reconciler::{ReconcileResult, SnapshotReconciler};
