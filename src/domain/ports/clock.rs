//! Time source port.
//!
//! All window math, due checks, and cron evaluation go through this
//! trait so tests can drive the governor with a manual clock.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

/// Supplies the current instant. Timezone conversion lives in the
/// services; the clock only answers "when is now".
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Shared freely across services
/// under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    // Unix nanos, so advancing is a single atomic add and no
    // precision is lost against a nanosecond start instant.
    nanos: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            nanos: Arc::new(AtomicI64::new(
                start.timestamp_nanos_opt().unwrap_or_default(),
            )),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.nanos
            .store(to.timestamp_nanos_opt().unwrap_or_default(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.nanos
            .fetch_add(by.num_nanoseconds().unwrap_or(0), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance(Duration::hours(2));
        let delta = clock.now_utc().signed_duration_since(start);
        assert_eq!(delta, Duration::hours(2));
    }

    #[test]
    fn test_manual_clock_preserves_start_instant() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now_utc(), start);
    }
}
