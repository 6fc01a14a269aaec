//! Time sources.
//!
//! Timer deadlines use monotonic [`Instant`]s; recency labels compare
//! server timestamps against wall-clock time. A [`Clock`] provides both so
//! tests can move them together.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// A source of monotonic and wall-clock time.
pub trait Clock: Send + Sync + Debug {
    /// Monotonic time used for timer deadlines.
    fn now(&self) -> Instant;

    /// Wall-clock time used for "time since last update" labels.
    fn wall(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug)]
struct ManualTime {
    instant: Instant,
    wall: DateTime<Utc>,
}

/// A clock that only moves when [`ManualClock::advance`] is called.
///
/// Clones share the same underlying time, so a test can keep one handle
/// while the supervisor holds another.
///
/// ```
/// use std::time::Duration;
/// use chrono::Utc;
/// use portfolio_pulse::schedule::{Clock, ManualClock};
///
/// let clock = ManualClock::new(Utc::now());
/// let before = clock.now();
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(clock.now() - before, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualTime>>,
}

impl ManualClock {
    /// Create a clock whose wall time starts at `wall`.
    pub fn new(wall: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualTime {
                instant: Instant::now(),
                wall,
            })),
        }
    }

    /// Move both monotonic and wall time forward.
    pub fn advance(&self, by: Duration) {
        let mut time = self.inner.lock();
        time.instant += by;
        let delta = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
        time.wall = time.wall + delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.lock().instant
    }

    fn wall(&self) -> DateTime<Utc> {
        self.inner.lock().wall
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advances_both_times() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let instant = clock.now();

        clock.advance(Duration::from_secs(90));

        assert_eq!(clock.now() - instant, Duration::from_secs(90));
        assert_eq!((clock.wall() - start).num_seconds(), 90);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(Utc::now());
        let other = clock.clone();
        let instant = clock.now();

        other.advance(Duration::from_millis(1500));

        assert_eq!(clock.now() - instant, Duration::from_millis(1500));
    }
}
