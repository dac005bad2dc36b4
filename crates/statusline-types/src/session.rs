//! Session time-tracking records persisted between renders.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A span of continuous activity, in Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: i64,
    /// Only absent while the heartbeat that created the interval is in progress.
    pub end: Option<i64>,
}

impl Interval {
    /// Closed interval covering a single instant.
    pub fn instant(at: i64) -> Self {
        Self {
            start: at,
            end: Some(at),
        }
    }

    /// Seconds covered, or `None` while the interval is still open.
    pub fn duration(&self) -> Option<i64> {
        self.end.map(|end| end - self.start)
    }
}

/// Accounting for one assistant session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    /// Local calendar date the session was first seen.
    pub date: NaiveDate,
    pub start: i64,
    pub last_heartbeat: i64,
    pub total_seconds: i64,
    #[serde(default)]
    pub intervals: Vec<Interval>,
}

impl SessionRecord {
    /// Fresh record with a single open interval starting at `now`.
    pub fn new(id: impl Into<String>, date: NaiveDate, now: i64) -> Self {
        Self {
            id: id.into(),
            date,
            start: now,
            last_heartbeat: now,
            total_seconds: 0,
            intervals: vec![Interval {
                start: now,
                end: None,
            }],
        }
    }

    /// Sum of all closed interval durations.
    pub fn closed_seconds(&self) -> i64 {
        self.intervals.iter().filter_map(Interval::duration).sum()
    }

    /// True when no interval is left open.
    pub fn is_closed(&self) -> bool {
        self.intervals.iter().all(|interval| interval.end.is_some())
    }

    /// Whether the last heartbeat falls inside `timeout_secs` of `now`.
    pub fn is_active_at(&self, now: i64, timeout_secs: i64) -> bool {
        now - self.last_heartbeat < timeout_secs
    }
}

/// Totals across every session dated today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub total_seconds: i64,
    /// Sessions with a heartbeat inside the activity timeout.
    pub active_sessions: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_new_record_has_open_interval() {
        let record = SessionRecord::new("s1", date(), 100);
        assert_eq!(record.intervals.len(), 1);
        assert!(!record.is_closed());
        assert_eq!(record.closed_seconds(), 0);
    }

    #[test]
    fn test_closed_seconds_ignores_open_intervals() {
        let mut record = SessionRecord::new("s1", date(), 0);
        record.intervals = vec![
            Interval { start: 0, end: Some(30) },
            Interval { start: 100, end: Some(160) },
            Interval { start: 200, end: None },
        ];
        assert_eq!(record.closed_seconds(), 90);
    }

    #[test]
    fn test_serialized_shape() {
        let mut record = SessionRecord::new("s1", date(), 10);
        record.intervals = vec![Interval::instant(10)];
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["date"], "2025-03-14");
        assert_eq!(value["intervals"][0]["end"], 10);
        assert_eq!(value["last_heartbeat"], 10);
    }

    #[test]
    fn test_activity_window() {
        let record = SessionRecord::new("s1", date(), 1_000);
        assert!(record.is_active_at(1_599, 600));
        assert!(!record.is_active_at(1_600, 600));
    }
}
