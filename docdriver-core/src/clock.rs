//! Timestamps for the reserved `_createdAt` / `_updatedAt` fields.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use std::fmt::Debug;

/// Source of the current time.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wraps a [`Clock`] so the times it hands out never go backwards.
#[derive(Debug)]
pub struct MonotonicClock {
    source: Box<dyn Clock>,
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new(source: Box<dyn Clock>) -> Self {
        Self { source, last: Mutex::new(None) }
    }

    /// Returns the later of the source time and the last time returned.
    pub fn now(&self) -> DateTime<Utc> {
        let now = self.source.now();
        let mut last = self.last.lock();

        let now = match *last {
            Some(previous) if previous > now => previous,
            _ => now,
        };
        *last = Some(now);
        now
    }

    /// The current time formatted for a reserved timestamp field.
    pub fn timestamp(&self) -> String {
        format_timestamp(self.now())
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

/// Formats a time as RFC 3339 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    };

    #[derive(Debug, Clone)]
    struct ManualClock(Arc<AtomicI64>);

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_millis_opt(self.0.load(Ordering::SeqCst)).unwrap()
        }
    }

    #[test]
    fn test_format_timestamp() {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(time), "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn test_monotonic_clock_never_goes_back() {
        let millis = Arc::new(AtomicI64::new(10_000));
        let clock = MonotonicClock::new(Box::new(ManualClock(millis.clone())));

        let first = clock.now();
        millis.store(5_000, Ordering::SeqCst);
        let second = clock.now();
        millis.store(20_000, Ordering::SeqCst);
        let third = clock.now();

        assert_eq!(first, second);
        assert!(third > second);
        assert_eq!(third.timestamp_millis(), 20_000);
    }

    #[test]
    fn test_timestamps_sort_lexically() {
        let clock = MonotonicClock::default();
        let first = clock.timestamp();
        let second = clock.timestamp();

        assert!(first <= second);
        assert!(first.ends_with('Z'));
    }
}
