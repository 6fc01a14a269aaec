//! Deterministic timer scheduling.
//!
//! The scheduler stores deadlines and hands due tasks back to its owner when
//! polled with the current time. It never sleeps or spawns, so every timer
//! in the crate can be driven from a test by advancing a [`ManualClock`].
//!
//! ```
//! use std::time::{Duration, Instant};
//! use portfolio_pulse::schedule::Scheduler;
//!
//! let start = Instant::now();
//! let mut timers = Scheduler::new();
//! let handle = timers.schedule_once(start, Duration::from_secs(1), "retry");
//!
//! assert!(timers.fire_due(start).is_empty());
//! assert_eq!(timers.fire_due(start + Duration::from_secs(1)), vec![(handle, "retry")]);
//! assert!(!timers.is_pending(handle));
//! ```

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Smallest period accepted for repeating timers.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Longest delay or period a timer can have. Larger values are clamped.
pub const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Identifies a scheduled timer so it can be cancelled later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    deadline: Instant,
    period: Option<Duration>,
    task: T,
}

/// A set of one-shot and repeating timers carrying tasks of type `T`.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    next_id: u64,
    entries: BTreeMap<TimerHandle, Entry<T>>,
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Scheduler<T> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: BTreeMap::new(),
        }
    }

    /// Schedule `task` to fire once, `delay` after `now`.
    ///
    /// Delays above [`MAX_DELAY`] are clamped.
    pub fn schedule_once(&mut self, now: Instant, delay: Duration, task: T) -> TimerHandle {
        self.insert(deadline_after(now, delay), None, task)
    }

    /// Schedule `task` to fire every `period`, first at `now + period`.
    pub fn schedule_every(&mut self, now: Instant, period: Duration, task: T) -> TimerHandle {
        let period = period.clamp(MIN_PERIOD, MAX_DELAY);
        self.insert(deadline_after(now, period), Some(period), task)
    }

    fn insert(&mut self, deadline: Instant, period: Option<Duration>, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            handle,
            Entry {
                deadline,
                period,
                task,
            },
        );
        handle
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    /// Whether the timer is still waiting to fire.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// The next deadline of a pending timer.
    pub fn deadline(&self, handle: TimerHandle) -> Option<Instant> {
        self.entries.get(&handle).map(|e| e.deadline)
    }

    /// The earliest deadline across all timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|e| e.deadline).min()
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no timers are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every task whose deadline is at or before `now`.
    ///
    /// Tasks come back in deadline order (ties broken by scheduling order).
    /// One-shot timers are dropped; repeating timers fire at most once per
    /// call and are re-armed to their next deadline after `now`, so a long
    /// pause does not produce a burst of catch-up firings.
    pub fn fire_due(&mut self, now: Instant) -> Vec<(TimerHandle, T)> {
        let mut due: Vec<(Instant, TimerHandle)> = self
            .entries
            .iter()
            .filter(|(_, e)| e.deadline <= now)
            .map(|(h, e)| (e.deadline, *h))
            .collect();
        due.sort();

        let mut fired = Vec::with_capacity(due.len());
        for (_, handle) in due {
            let Some(entry) = self.entries.get_mut(&handle) else {
                continue;
            };
            let task = entry.task.clone();
            match entry.period {
                Some(period) => {
                    let missed = (now - entry.deadline).as_nanos() / period.as_nanos();
                    let steps = u32::try_from(missed + 1).unwrap_or(u32::MAX);
                    let next = period
                        .checked_mul(steps)
                        .and_then(|offset| entry.deadline.checked_add(offset))
                        .filter(|next| *next > now)
                        .unwrap_or_else(|| deadline_after(now, period));
                    entry.deadline = next;
                }
                None => {
                    self.entries.remove(&handle);
                }
            }
            fired.push((handle, task));
        }
        fired
    }
}

/// `now + delay` with the delay clamped to [`MAX_DELAY`].
///
/// Falls back to shorter offsets on platforms whose `Instant` cannot
/// represent a year ahead.
fn deadline_after(now: Instant, delay: Duration) -> Instant {
    let mut delay = delay.min(MAX_DELAY);
    loop {
        if let Some(deadline) = now.checked_add(delay) {
            return deadline;
        }
        delay /= 2;
    }
}
