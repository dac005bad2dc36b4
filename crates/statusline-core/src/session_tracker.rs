//! Session time tracking across short-lived invocations.
//!
//! Each render is a heartbeat. Heartbeats closer together than the activity timeout extend
//! the current interval; a heartbeat after a longer silence opens a new one, so idle time is
//! never counted. Records are kept in a write-cache and written to disk at most once per
//! debounce window.

use crate::clock::{Clock, SystemClock};
use crate::session_store::SessionStore;
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use statusline_types::{DailySummary, Interval, SessionRecord};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Tracker tuning.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Silence longer than this starts a new interval.
    pub timeout: Duration,
    /// Minimum time between disk writes of the same session.
    pub debounce: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            debounce: Duration::from_secs(2),
        }
    }
}

/// What a heartbeat did with the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    Written,
    /// Held in memory because the last write was inside the debounce window.
    Debounced,
}

struct CachedSession {
    record: SessionRecord,
    last_write: Option<DateTime<Utc>>,
    dirty: bool,
}

/// Heartbeat-driven session accounting backed by a [`SessionStore`].
pub struct SessionTracker {
    store: SessionStore,
    clock: Arc<dyn Clock>,
    config: TrackerConfig,
    cache: RwLock<HashMap<String, CachedSession>>,
}

impl SessionTracker {
    pub fn new(store: SessionStore, config: TrackerConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: SessionStore, config: TrackerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn timeout_secs(&self) -> i64 {
        i64::try_from(self.config.timeout.as_secs()).unwrap_or(i64::MAX)
    }

    /// Record activity for `session_id` at the current time.
    pub fn heartbeat(&self, session_id: &str) -> Result<Persistence> {
        self.store.path_for(session_id)?;

        let now = self.clock.now();
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);

        let entry = match cache.entry(session_id.to_string()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                let record = self.load_or_create(session_id, now.timestamp());
                vacant.insert(CachedSession {
                    record,
                    last_write: None,
                    dirty: false,
                })
            }
        };

        apply_heartbeat(&mut entry.record, now.timestamp(), self.timeout_secs());
        entry.dirty = true;

        if let Some(last_write) = entry.last_write {
            let since = (now - last_write).to_std().unwrap_or_default();
            if since < self.config.debounce {
                trace!(
                    target: "statusline::session",
                    "Debounced write for {} ({:?} since last write)",
                    session_id,
                    since
                );
                return Ok(Persistence::Debounced);
            }
        }

        self.store.save(&entry.record)?;
        entry.last_write = Some(now);
        entry.dirty = false;

        debug!(
            target: "statusline::session",
            "Heartbeat for {}: {} intervals, {}s total",
            session_id,
            entry.record.intervals.len(),
            entry.record.total_seconds
        );
        Ok(Persistence::Written)
    }

    /// Write every record still held back by the debounce window.
    pub fn flush(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);

        let mut written = 0;
        let mut first_error = None;
        for entry in cache.values_mut().filter(|entry| entry.dirty) {
            match self.store.save(&entry.record) {
                Ok(()) => {
                    entry.last_write = Some(now);
                    entry.dirty = false;
                    written += 1;
                }
                Err(e) => {
                    warn!(
                        target: "statusline::session",
                        "Failed to flush session {}: {}",
                        entry.record.id,
                        e
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    /// Totals for every session dated today. Unflushed in-memory records take precedence
    /// over their on-disk copies.
    pub fn daily_summary(&self) -> Result<DailySummary> {
        let mut records: HashMap<String, SessionRecord> = self
            .store
            .list()?
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            for entry in cache.values().filter(|entry| entry.dirty) {
                records.insert(entry.record.id.clone(), entry.record.clone());
            }
        }

        Ok(summarize(
            records.values(),
            self.clock.today(),
            self.clock.unix_seconds(),
            self.timeout_secs(),
        ))
    }

    fn load_or_create(&self, session_id: &str, now: i64) -> SessionRecord {
        match self.store.load(session_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(target: "statusline::session", "Starting new session {}", session_id);
                SessionRecord::new(session_id, self.clock.today(), now)
            }
            Err(e) => {
                debug!(
                    target: "statusline::session",
                    "Reinitializing session {}: {}",
                    session_id,
                    e
                );
                SessionRecord::new(session_id, self.clock.today(), now)
            }
        }
    }
}

/// Advance a record to `now`.
///
/// A gap shorter than `timeout_secs` extends the latest interval to `now`; anything longer
/// appends a zero-length interval at `now`. `total_seconds` is recomputed afterwards.
pub fn apply_heartbeat(record: &mut SessionRecord, now: i64, timeout_secs: i64) {
    let previous = record.last_heartbeat;
    let gap = now - previous;
    record.last_heartbeat = now;

    if gap < timeout_secs {
        match record.intervals.last_mut() {
            // Clamped so a clock step backwards cannot produce a negative span.
            Some(last) => last.end = Some(now.max(last.start)),
            None => record.intervals.push(Interval::instant(now)),
        }
    }

    // Anything still open was left by an interrupted writer and ends at the heartbeat it saw.
    for interval in record.intervals.iter_mut().filter(|i| i.end.is_none()) {
        interval.end = Some(previous.max(interval.start));
    }

    if gap >= timeout_secs {
        record.intervals.push(Interval::instant(now));
    }

    record.total_seconds = record.closed_seconds();
}

/// Sum `total_seconds` over records dated `today` and count the ones still active.
pub fn summarize<'a>(
    records: impl IntoIterator<Item = &'a SessionRecord>,
    today: NaiveDate,
    now: i64,
    timeout_secs: i64,
) -> DailySummary {
    records
        .into_iter()
        .filter(|record| record.date == today)
        .fold(DailySummary::default(), |mut summary, record| {
            summary.total_seconds += record.total_seconds;
            if record.is_active_at(now, timeout_secs) {
                summary.active_sessions += 1;
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::StatuslineError;
    use chrono::TimeDelta;
    use std::fs;

    const TIMEOUT: i64 = 600;

    struct Harness {
        _dir: tempfile::TempDir,
        clock: Arc<ManualClock>,
        tracker: SessionTracker,
    }

    fn harness(start: i64, debounce: Duration) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::at(start));
        let store = SessionStore::open(dir.path()).unwrap();
        let config = TrackerConfig {
            timeout: Duration::from_secs(TIMEOUT as u64),
            debounce,
        };
        let tracker = SessionTracker::with_clock(store, config, clock.clone());
        Harness {
            _dir: dir,
            clock,
            tracker,
        }
    }

    fn beat_at(h: &Harness, at: i64) -> Persistence {
        h.clock.set(DateTime::from_timestamp(at, 0).unwrap());
        h.tracker.heartbeat("s1").unwrap()
    }

    fn on_disk(h: &Harness) -> SessionRecord {
        h.tracker.store().load("s1").unwrap().unwrap()
    }

    #[test]
    fn test_contiguous_heartbeats_extend_one_interval() {
        let h = harness(0, Duration::ZERO);
        for at in [0, 5, 10] {
            assert_eq!(beat_at(&h, at), Persistence::Written);
        }

        let record = on_disk(&h);
        assert_eq!(record.intervals, vec![Interval { start: 0, end: Some(10) }]);
        assert_eq!(record.total_seconds, 10);
        assert_eq!(record.total_seconds, record.last_heartbeat - record.start);
    }

    #[test]
    fn test_gap_beyond_timeout_opens_new_interval() {
        let h = harness(0, Duration::ZERO);
        beat_at(&h, 0);
        beat_at(&h, 1_000);

        let record = on_disk(&h);
        assert_eq!(
            record.intervals,
            vec![Interval::instant(0), Interval::instant(1_000)]
        );
        assert_eq!(record.total_seconds, 0);

        beat_at(&h, 1_030);
        let record = on_disk(&h);
        assert_eq!(record.intervals[1], Interval { start: 1_000, end: Some(1_030) });
        assert_eq!(record.total_seconds, 30);
    }

    #[test]
    fn test_gap_exactly_at_timeout_is_a_new_interval() {
        let h = harness(0, Duration::ZERO);
        beat_at(&h, 100);
        beat_at(&h, 100 + TIMEOUT);
        assert_eq!(on_disk(&h).intervals.len(), 2);
    }

    #[test]
    fn test_persisted_intervals_are_closed() {
        let h = harness(0, Duration::ZERO);
        beat_at(&h, 50);
        assert!(on_disk(&h).is_closed());
    }

    #[test]
    fn test_open_interval_from_disk_is_closed_before_gap() {
        let h = harness(0, Duration::ZERO);
        let mut interrupted = SessionRecord::new("s1", h.clock.today(), 0);
        interrupted.last_heartbeat = 30;
        h.tracker.store().save(&interrupted).unwrap();
        assert!(!on_disk(&h).is_closed());

        beat_at(&h, 5_000);
        let record = on_disk(&h);
        assert!(record.is_closed());
        assert_eq!(
            record.intervals,
            vec![Interval { start: 0, end: Some(30) }, Interval::instant(5_000)]
        );
        assert_eq!(record.total_seconds, 30);
    }

    #[test]
    fn test_debounce_skips_and_flush_writes() {
        let h = harness(0, Duration::from_secs(2));
        assert_eq!(beat_at(&h, 100), Persistence::Written);
        assert_eq!(beat_at(&h, 101), Persistence::Debounced);
        assert_eq!(on_disk(&h).last_heartbeat, 100);

        assert_eq!(beat_at(&h, 103), Persistence::Written);
        assert_eq!(on_disk(&h).last_heartbeat, 103);

        assert_eq!(beat_at(&h, 104), Persistence::Debounced);
        assert_eq!(h.tracker.flush().unwrap(), 1);
        let record = on_disk(&h);
        assert_eq!(record.last_heartbeat, 104);
        assert_eq!(record.total_seconds, 4);
        assert_eq!(h.tracker.flush().unwrap(), 0);
    }

    #[test]
    fn test_corrupt_file_is_treated_as_missing() {
        let h = harness(500, Duration::ZERO);
        fs::write(h.tracker.store().dir().join("s1.json"), "{ definitely not").unwrap();

        beat_at(&h, 500);
        let record = on_disk(&h);
        assert_eq!(record.start, 500);
        assert_eq!(record.intervals, vec![Interval::instant(500)]);
        assert_eq!(record.total_seconds, 0);
    }

    #[test]
    fn test_resumes_existing_record() {
        let h = harness(0, Duration::ZERO);
        let mut existing = SessionRecord::new("s1", h.clock.today(), 0);
        existing.intervals = vec![Interval { start: 0, end: Some(40) }];
        existing.last_heartbeat = 40;
        existing.total_seconds = 40;
        h.tracker.store().save(&existing).unwrap();

        beat_at(&h, 70);
        let record = on_disk(&h);
        assert_eq!(record.intervals, vec![Interval { start: 0, end: Some(70) }]);
        assert_eq!(record.total_seconds, 70);
    }

    #[test]
    fn test_invalid_session_id_is_rejected() {
        let h = harness(0, Duration::ZERO);
        let err = h.tracker.heartbeat("../etc").unwrap_err();
        assert!(matches!(err, StatuslineError::InvalidSessionId(_)));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let tracker = SessionTracker::with_clock(
            SessionStore::at(blocker.join("sessions")),
            TrackerConfig::default(),
            Arc::new(ManualClock::at(10)),
        );
        assert!(tracker.heartbeat("s1").is_err());
        assert!(tracker.flush().is_err());
    }

    #[test]
    fn test_daily_summary_counts_today_and_active() {
        let h = harness(10_000, Duration::ZERO);
        let today = h.clock.today();
        let store = h.tracker.store();

        let mut recent = SessionRecord::new("recent", today, 9_000);
        recent.intervals = vec![Interval { start: 9_000, end: Some(9_900) }];
        recent.last_heartbeat = 9_900;
        recent.total_seconds = 900;
        store.save(&recent).unwrap();

        let mut idle = SessionRecord::new("idle", today, 1_000);
        idle.intervals = vec![Interval { start: 1_000, end: Some(1_300) }];
        idle.last_heartbeat = 1_300;
        idle.total_seconds = 300;
        store.save(&idle).unwrap();

        let mut old = SessionRecord::new("old", today - TimeDelta::days(1), 9_950);
        old.intervals = vec![Interval { start: 9_950, end: Some(9_990) }];
        old.last_heartbeat = 9_990;
        old.total_seconds = 40;
        store.save(&old).unwrap();

        let summary = h.tracker.daily_summary().unwrap();
        assert_eq!(summary.total_seconds, 1_200);
        assert_eq!(summary.active_sessions, 1);
    }

    #[test]
    fn test_daily_summary_prefers_unflushed_records() {
        let h = harness(0, Duration::from_secs(60));
        beat_at(&h, 0);
        beat_at(&h, 45);

        assert_eq!(on_disk(&h).total_seconds, 0);
        let summary = h.tracker.daily_summary().unwrap();
        assert_eq!(summary.total_seconds, 45);
        assert_eq!(summary.active_sessions, 1);
    }

    #[test]
    fn test_apply_heartbeat_clamps_backwards_clock() {
        let mut record = SessionRecord::new("s", NaiveDate::MIN, 100);
        apply_heartbeat(&mut record, 100, TIMEOUT);
        apply_heartbeat(&mut record, 90, TIMEOUT);
        assert_eq!(record.intervals, vec![Interval::instant(100)]);
        assert_eq!(record.total_seconds, 0);
    }
}
