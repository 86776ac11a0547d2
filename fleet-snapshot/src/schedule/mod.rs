//! Schedule Calculator
//!
//! Pure computation, never blocks. Given a snapshot's cron expression, the
//! last handled due time (or the creation time) and "now", it decides
//! whether a run is due, not yet due, or missed.
//!
//! # Rules
//!
//! - **Cron grid**: 5-field expressions (`min hour dom month dow`), evaluated in
//!   the snapshot's time zone (UTC by default)
//! - **Due time**: earliest grid instant strictly after the anchor that is `<= now`
//! - **Floor**: a recorded `next_schedule_time` later than that instant replaces it,
//!   so skipped (missed) slots are never revisited
//! - **Starting deadline**: if `now - due > starting_deadline_seconds` the run is
//!   missed and the next time is computed from `now`
//! - **Terminal schedules**: an expression with no future occurrence is an error,
//!   never "not due"

pub mod calculator;
pub mod cron;

pub use calculator::{evaluate, next_fire_after, NextFire, ScheduleDecision};
pub use cron::CronSchedule;
