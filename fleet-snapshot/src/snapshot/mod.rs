// File: src/snapshot/mod.rs

//! Snapshot schedule definitions and their status
//!
//! A **Snapshot** is a named, cluster-scoped schedule that periodically
//! captures fleet state to `storage/<name>/`. It pairs a user-owned
//! [`SnapshotSpec`] with a scheduler-owned [`SnapshotStatus`].
//!
//! # Status lifecycle
//!
//! 1. Due time reached: status becomes [`RunStatus::Running`]
//! 2. Capture completes: [`RunStatus::Succeeded`] or [`RunStatus::Failed`]
//! 3. Due time passed beyond the starting deadline: [`RunStatus::Missed`], no capture
//!
//! Every outcome consumes its due time and advances `next_schedule_time`.

pub mod model;

pub use model::{RunStatus, Snapshot, SnapshotSpec, SnapshotStatus};
