//! Connection lifecycle supervision.
//!
//! The [`ConnectionSupervisor`] is the single source of truth for whether
//! live updates are flowing. It owns the reconnection backoff loop and the
//! heartbeat that keeps the "last updated" label current.
//!
//! ```text
//!            set_connected(true)
//!   ┌──────────────┐ ─────────▶ ┌───────────┐
//!   │ Disconnected │            │ Connected │
//!   └──────────────┘ ◀───────── └───────────┘
//!          │        set_connected(false)
//!          ▼
//!   Idle ──▶ Waiting(delay) ──▶ AttemptInFlight ──▶ (transport reports back)
//! ```
//!
//! Timers live in a [`Scheduler`] and fire only from
//! [`ConnectionSupervisor::poll_timers`], so a test can walk the whole
//! backoff sequence by advancing a [`ManualClock`](crate::schedule::ManualClock).

mod retry;

pub use retry::{
    RetryOutcome, RetryPhase, RetryPolicy, RetryState, INITIAL_DELAY_MS, MAX_ATTEMPTS,
    MAX_DELAY_MS,
};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::board::{Board, ElementId};
use crate::data::recency::{parse_timestamp, relative_label};
use crate::schedule::{Clock, Scheduler, TimerHandle};
use crate::source::Reopen;

/// Default interval of the "last updated" refresh.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Whether live updates are being received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Reconnect,
    Heartbeat,
}

/// Tunables for a [`ConnectionSupervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    pub retry: RetryPolicy,
    pub heartbeat_interval: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            heartbeat_interval: HEARTBEAT_INTERVAL,
        }
    }
}

/// Owns connection state, the reconnect loop and the heartbeat.
#[derive(Debug)]
pub struct ConnectionSupervisor {
    state: ConnectionState,
    retry: RetryState,
    phase: RetryPhase,
    clock: Arc<dyn Clock>,
    reopen: Box<dyn Reopen>,
    timers: Scheduler<Task>,
    heartbeat: Option<TimerHandle>,
    reconnect: Option<TimerHandle>,
}

impl ConnectionSupervisor {
    /// Create a supervisor and start its heartbeat.
    pub fn new(clock: Arc<dyn Clock>, reopen: Box<dyn Reopen>, settings: SupervisorSettings) -> Self {
        let mut timers = Scheduler::new();
        let heartbeat =
            timers.schedule_every(clock.now(), settings.heartbeat_interval, Task::Heartbeat);

        Self {
            state: ConnectionState::Disconnected,
            retry: RetryState::new(settings.retry),
            phase: RetryPhase::Idle,
            clock,
            reopen,
            timers,
            heartbeat: Some(heartbeat),
            reconnect: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn retry(&self) -> &RetryState {
        &self.retry
    }

    pub fn phase(&self) -> RetryPhase {
        self.phase
    }

    /// Whether the heartbeat timer is still running.
    pub fn heartbeat_active(&self) -> bool {
        self.heartbeat.is_some_and(|h| self.timers.is_pending(h))
    }

    /// Whether a reconnect timer is armed.
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect.is_some_and(|h| self.timers.is_pending(h))
    }

    /// Number of armed timers, heartbeat included.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Time left until the pending reconnect fires.
    pub fn next_reconnect_in(&self) -> Option<Duration> {
        let deadline = self.timers.deadline(self.reconnect?)?;
        Some(deadline.saturating_duration_since(self.clock.now()))
    }

    /// Earliest timer deadline, for sizing the driver's sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Record a transport open (`true`) or close/error (`false`).
    ///
    /// Connecting resets the retry state and cancels any pending reconnect.
    /// Disconnecting runs the reconnection algorithm and returns its outcome.
    pub fn set_connected(&mut self, connected: bool, board: &mut Board) -> Option<RetryOutcome> {
        if connected {
            if self.state != ConnectionState::Connected {
                info!(attempts = self.retry.attempts(), "Live stream connected");
            }
            self.state = ConnectionState::Connected;
            self.retry.reset();
            if let Some(handle) = self.reconnect.take() {
                self.timers.cancel(handle);
            }
            self.phase = RetryPhase::Idle;
            self.apply_indicators(board);
            None
        } else {
            if self.state == ConnectionState::Connected {
                warn!("Live stream disconnected");
            }
            self.state = ConnectionState::Disconnected;
            self.apply_indicators(board);
            Some(self.schedule_reconnect())
        }
    }

    /// Show the indicator for the current state and hide the other.
    pub fn apply_indicators(&self, board: &mut Board) {
        match self.state {
            ConnectionState::Connected => {
                board.show(ElementId::Connected);
                board.hide(ElementId::Disconnected);
            }
            ConnectionState::Disconnected => {
                board.show(ElementId::Disconnected);
                board.hide(ElementId::Connected);
            }
        }
    }

    /// Arm a reconnect timer unless one is pending or attempts are used up.
    pub fn schedule_reconnect(&mut self) -> RetryOutcome {
        if self.reconnect_pending() {
            debug!("Reconnect already pending");
            return RetryOutcome::AlreadyPending;
        }

        if self.retry.is_exhausted() {
            error!(
                attempts = self.retry.attempts(),
                "Reconnection attempts exhausted, manual reconnect required"
            );
            self.reconnect = None;
            self.phase = RetryPhase::Idle;
            return RetryOutcome::Exhausted;
        }

        let delay = self.retry.delay();
        let handle = self.timers.schedule_once(self.clock.now(), delay, Task::Reconnect);
        self.reconnect = Some(handle);
        self.phase = RetryPhase::Waiting {
            delay_ms: self.retry.delay_ms(),
        };
        info!(
            delay_ms = self.retry.delay_ms(),
            attempt = self.retry.attempts() + 1,
            "Scheduling reconnect"
        );
        RetryOutcome::Scheduled { delay }
    }

    /// Fire every timer that is due. Returns how many fired.
    pub fn poll_timers(&mut self, board: &mut Board) -> usize {
        let fired = self.timers.fire_due(self.clock.now());
        for (handle, task) in &fired {
            match task {
                Task::Reconnect => self.fire_reconnect(*handle),
                Task::Heartbeat => self.update_relative_times(board),
            }
        }
        fired.len()
    }

    fn fire_reconnect(&mut self, handle: TimerHandle) {
        if self.reconnect == Some(handle) {
            self.reconnect = None;
        }
        self.retry.advance();
        self.phase = RetryPhase::AttemptInFlight;
        info!(
            attempt = self.retry.attempts(),
            max_attempts = self.retry.max_attempts(),
            "Requesting stream re-open"
        );
        self.reopen.request_reopen();
    }

    /// Re-render the "last updated" label from its recorded timestamp.
    ///
    /// Does nothing if the element is not mounted or no update has been
    /// recorded yet.
    pub fn update_relative_times(&self, board: &mut Board) {
        let now = self.clock.wall();
        let Some(element) = board.element_mut(ElementId::LastUpdated) else {
            return;
        };
        let Some(stamp) = element.timestamp.as_deref() else {
            return;
        };
        match parse_timestamp(stamp) {
            Ok(at) => element.text = relative_label(at, now),
            Err(err) => debug!(timestamp = stamp, error = %err, "Unreadable last-updated timestamp"),
        }
    }

    /// Ask the transport to re-open now, outside the backoff schedule.
    ///
    /// Retry counters are left alone; only a successful connect resets them.
    pub fn request_manual_reconnect(&mut self) {
        if let Some(handle) = self.reconnect.take() {
            self.timers.cancel(handle);
        }
        self.phase = RetryPhase::AttemptInFlight;
        info!("Manual reconnect requested");
        self.reopen.request_reopen();
    }

    /// Cancel the heartbeat and any pending reconnect.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.heartbeat.take() {
            self.timers.cancel(handle);
        }
        if let Some(handle) = self.reconnect.take() {
            self.timers.cancel(handle);
        }
        self.phase = RetryPhase::Idle;
    }
}
