//! Monotonic creation-timestamp source.
//!
//! Wall-clock time can step backwards (NTP adjustments) and two entries
//! created within the same microsecond would otherwise share a timestamp.
//! [`EntryClock`] hands out strictly increasing timestamps truncated to
//! microseconds, which is also the resolution PostgreSQL keeps for
//! `TIMESTAMPTZ`, so a timestamp survives a database round trip unchanged.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Strictly increasing, microsecond-precision timestamp source.
///
/// The guarantee is per clock instance; the service owns a single clock so
/// it holds per process. Nothing is promised across replicas.
#[derive(Debug, Default)]
pub struct EntryClock {
    last_micros: AtomicI64,
}

impl EntryClock {
    /// Creates a clock with no prior readings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next timestamp.
    ///
    /// This is the current wall-clock time truncated to microseconds, or one
    /// microsecond past the previous reading if the wall clock has not
    /// advanced past it.
    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let mut prev = self.last_micros.load(Ordering::Acquire);
        loop {
            let next = wall.max(prev.saturating_add(1));
            match self.last_micros.compare_exchange_weak(
                prev,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return DateTime::from_timestamp_micros(next).unwrap_or_else(Utc::now),
                Err(current) => prev = current,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn readings_strictly_increase() {
        let clock = EntryClock::new();
        let mut prev = clock.now();
        for _ in 0..10_000 {
            let next = clock.now();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn readings_have_no_sub_microsecond_component() {
        let clock = EntryClock::new();
        let ts = clock.now();
        assert_eq!(ts.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn reading_is_not_before_wall_clock() {
        let clock = EntryClock::new();
        let before = Utc::now().timestamp_micros();
        let ts = clock.now();
        assert!(ts.timestamp_micros() >= before);
    }

    #[tokio::test]
    async fn concurrent_readings_are_distinct() {
        let clock = Arc::new(EntryClock::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let clock = Arc::clone(&clock);
            handles.push(tokio::spawn(async move {
                (0..500).map(|_| clock.now()).collect::<Vec<_>>()
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap_or_default());
        }
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
        assert_eq!(total, 4_000);
    }
}
