// File: src/schedule/cron.rs
use chrono::{DateTime, SubsecRound, Utc};
use chrono_tz::Tz;
use croner::Cron;
use std::fmt;

use crate::errors::SnapshotError;
use crate::snapshot::SnapshotSpec;

/// A parsed, validated 5-field cron expression bound to a time zone
#[derive(Clone)]
pub struct CronSchedule {
    expression: String,
    cron: Cron,
    time_zone: Option<Tz>,
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CronSchedule")
            .field("expression", &self.expression)
            .field("time_zone", &self.time_zone)
            .finish()
    }
}

impl CronSchedule {
    pub fn parse(expression: &str, time_zone: Option<&str>) -> Result<Self, SnapshotError> {
        let invalid = |reason: String| SnapshotError::InvalidSchedule {
            schedule: expression.to_string(),
            reason,
        };

        validate_5_field_cron(expression).map_err(invalid)?;

        let cron = Cron::new(expression.trim())
            .parse()
            .map_err(|e| invalid(e.to_string()))?;

        let time_zone = match time_zone {
            Some(zone) => Some(
                zone.parse::<Tz>()
                    .map_err(|e| invalid(format!("unknown time zone '{}': {}", zone, e)))?,
            ),
            None => None,
        };

        Ok(Self {
            expression: expression.trim().to_string(),
            cron,
            time_zone,
        })
    }

    pub fn for_spec(spec: &SnapshotSpec) -> Result<Self, SnapshotError> {
        Self::parse(&spec.schedule, spec.time_zone.as_deref())
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Earliest grid instant strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>, SnapshotError> {
        // Grid instants have zero seconds, so truncating keeps "strictly after".
        let start = after.trunc_subsecs(0);

        let next = match &self.time_zone {
            Some(tz) => self
                .cron
                .find_next_occurrence(&start.with_timezone(tz), false)
                .map(|t| t.with_timezone(&Utc)),
            None => self.cron.find_next_occurrence(&start, false),
        };

        next.map_err(|_| SnapshotError::NoFutureOccurrence {
            schedule: self.expression.clone(),
            after,
        })
    }
}

/// Snapshots run at minute granularity: exactly 5 fields, no seconds
fn validate_5_field_cron(schedule: &str) -> Result<(), String> {
    let parts: Vec<&str> = schedule.split_whitespace().collect();

    if parts.len() != 5 {
        return Err(format!(
            "expected exactly 5 fields: minute hour day month dayofweek. Got {} fields",
            parts.len()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use test_case::test_case;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 9, h, m, s).unwrap()
    }

    #[test_case("*/5 * * * *", at(12, 3, 0), at(12, 5, 0) ; "step from mid slot")]
    #[test_case("*/5 * * * *", at(12, 5, 0), at(12, 10, 0) ; "aligned anchor is excluded")]
    #[test_case("*/5 * * * *", at(12, 4, 59), at(12, 5, 0) ; "one second before slot")]
    #[test_case("0 2 * * *", at(3, 0, 0), Utc.with_ymd_and_hms(2025, 1, 10, 2, 0, 0).unwrap() ; "daily rolls to next day")]
    fn test_next_after(expression: &str, after: DateTime<Utc>, expected: DateTime<Utc>) {
        let schedule = CronSchedule::parse(expression, None).unwrap();
        assert_eq!(schedule.next_after(after).unwrap(), expected);
    }

    #[test]
    fn test_next_after_is_strict_with_subsecond_anchor() {
        let schedule = CronSchedule::parse("*/5 * * * *", None).unwrap();
        let anchor = at(12, 5, 0) + chrono::Duration::milliseconds(500);
        assert_eq!(schedule.next_after(anchor).unwrap(), at(12, 10, 0));
    }

    #[test_case("* * * * * *" ; "six fields")]
    #[test_case("*/5 * * *" ; "four fields")]
    #[test_case("" ; "empty")]
    #[test_case("61 * * * *" ; "minute out of range")]
    #[test_case("every five minutes please" ; "words")]
    fn test_invalid_expressions_are_rejected(expression: &str) {
        let err = CronSchedule::parse(expression, None).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidSchedule { .. }), "{:?}", err);
    }

    #[test]
    fn test_unknown_time_zone_is_invalid_schedule() {
        let err = CronSchedule::parse("0 2 * * *", Some("Mars/Olympus_Mons")).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidSchedule { .. }));
    }

    #[test]
    fn test_time_zone_shifts_grid() {
        let schedule = CronSchedule::parse("0 2 * * *", Some("Europe/Sofia")).unwrap();
        let next = schedule.next_after(at(0, 30, 0)).unwrap();
        // 02:00 in Sofia (UTC+2 in January) is 00:00 UTC, already passed; next is the following day
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap());
        assert_eq!(next.minute(), 0);
    }

    #[test]
    fn test_impossible_date_has_no_future_occurrence() {
        let schedule = CronSchedule::parse("0 0 30 2 *", None).unwrap();
        let err = schedule.next_after(at(0, 0, 0)).unwrap_err();
        assert!(matches!(err, SnapshotError::NoFutureOccurrence { .. }));
    }
}
