//! Reconnection backoff state.

use std::time::Duration;

use serde::Deserialize;

/// Reconnect attempts allowed before giving up for the session.
pub const MAX_ATTEMPTS: u32 = 5;

/// Delay before the first reconnect attempt.
pub const INITIAL_DELAY_MS: u64 = 1_000;

/// Upper bound on the reconnect delay.
pub const MAX_DELAY_MS: u64 = 30_000;

/// Limits for the reconnection loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            initial_delay_ms: INITIAL_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
        }
    }
}

/// Attempt counter and current delay.
///
/// `attempts` never exceeds `max_attempts`, and the delay only grows until
/// [`RetryState::reset`] is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    attempts: u32,
    delay_ms: u64,
    policy: RetryPolicy,
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            attempts: 0,
            delay_ms: policy.initial_delay_ms,
            policy,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// No attempts left this session.
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }

    /// Back to zero attempts and the initial delay.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.delay_ms = self.policy.initial_delay_ms;
    }

    /// Count a fired attempt and double the delay, capped.
    pub fn advance(&mut self) {
        self.attempts = (self.attempts + 1).min(self.policy.max_attempts);
        self.delay_ms = self.delay_ms.saturating_mul(2).min(self.policy.max_delay_ms);
    }
}

/// Where the reconnection loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPhase {
    /// Nothing scheduled.
    #[default]
    Idle,
    /// A reconnect timer is pending.
    Waiting { delay_ms: u64 },
    /// The transport was asked to re-open and has not reported back.
    AttemptInFlight,
}

/// Result of asking the supervisor to reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// A reconnect timer was armed.
    Scheduled { delay: Duration },
    /// A reconnect timer was already pending; nothing new was armed.
    AlreadyPending,
    /// All attempts are used up; nothing will be scheduled.
    Exhausted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = RetryState::default();
        assert_eq!(state.attempts(), 0);
        assert_eq!(state.delay_ms(), 1000);
        assert_eq!(state.max_attempts(), 5);
        assert!(!state.is_exhausted());
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let mut state = RetryState::new(RetryPolicy {
            max_attempts: 10,
            ..RetryPolicy::default()
        });
        let mut delays = vec![state.delay_ms()];
        for _ in 0..6 {
            state.advance();
            delays.push(state.delay_ms());
        }
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]);
    }

    #[test]
    fn test_cap_from_twenty_seconds() {
        let mut state = RetryState::new(RetryPolicy {
            initial_delay_ms: 20_000,
            ..RetryPolicy::default()
        });
        state.advance();
        assert_eq!(state.delay_ms(), 30_000);
    }

    #[test]
    fn test_attempts_never_exceed_max() {
        let mut state = RetryState::default();
        for _ in 0..8 {
            state.advance();
        }
        assert_eq!(state.attempts(), 5);
        assert!(state.is_exhausted());
    }

    #[test]
    fn test_reset() {
        let mut state = RetryState::default();
        state.advance();
        state.advance();
        state.reset();
        assert_eq!(state, RetryState::default());
    }
}
