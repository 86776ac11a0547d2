//! Capture of fleet state into timestamped directories
//!
//! One scheduled run produces one **capture**: a directory named after the
//! run's start instant under `storage/<snapshot>/`, holding one subdirectory
//! per category and one JSON file per object.
//!
//! ```text
//! /data/nightly/20250109T020000.000Z/
//! ├── capture.json                      (only when the run completed)
//! ├── clusters/ManagedCluster--edge-1.json
//! ├── workloads/Workload-apps-frontend.json
//! └── referenced/Secret-apps-db.json
//! ```
//!
//! Captures are append-only history. A failed run leaves its partial
//! directory in place; only the retention pruner deletes captures.

pub mod orchestrator;
pub mod writer;

pub use orchestrator::{parse_capture_dir_name, CaptureManifest, CaptureOrchestrator, CaptureRun};
pub use writer::{object_file_name, ObjectWriter};
