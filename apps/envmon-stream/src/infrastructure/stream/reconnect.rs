//! Reconnect Backoff
//!
//! Exponential backoff with jitter for the supervisor that replaces a
//! finished session. Sessions never retry on their own; the supervisor asks
//! this policy how long to wait before building the next one.

use std::time::Duration;

use rand::Rng;

use super::session::{SessionOutcome, SessionState};
use crate::infrastructure::config::StreamSettings;

/// Backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay (before jitter).
    pub max_delay: Duration,
    /// Growth factor per attempt.
    pub multiplier: f64,
    /// Relative jitter, e.g. `0.1` for ±10%.
    pub jitter_factor: f64,
    /// Retry budget; 0 means unlimited.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter_factor: 0.1,
            max_attempts: 0,
        }
    }
}

impl ReconnectConfig {
    /// Build from stream settings with the default jitter.
    #[must_use]
    pub fn from_stream_settings(settings: &StreamSettings) -> Self {
        Self {
            initial_delay: settings.reconnect_delay_initial,
            max_delay: settings.reconnect_delay_max,
            multiplier: settings.reconnect_delay_multiplier,
            max_attempts: settings.max_reconnect_attempts,
            ..Self::default()
        }
    }
}

/// What the supervisor should do after a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Wait, then start a new session.
    RetryAfter(Duration),
    /// Do not start another session.
    GiveUp,
}

/// Backoff state across consecutive failed sessions.
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    attempts: u32,
}

impl ReconnectPolicy {
    /// Create a policy with no attempts recorded.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Decide based on how the last session ended.
    ///
    /// Cancelled sessions are never retried. A session that delivered
    /// readings resets the backoff first.
    pub fn after(&mut self, outcome: &SessionOutcome) -> ReconnectDecision {
        if outcome.state == SessionState::Aborted {
            return ReconnectDecision::GiveUp;
        }
        if outcome.readings > 0 {
            self.reset();
        }
        self.next_delay()
            .map_or(ReconnectDecision::GiveUp, ReconnectDecision::RetryAfter)
    }

    /// Consume one attempt and return its jittered delay.
    ///
    /// Returns `None` once the attempt budget is spent.
    #[must_use]
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        let delay = self.base_delay(self.attempts);
        self.attempts = self.attempts.saturating_add(1);
        Some(self.jitter(delay))
    }

    /// Forget previous failures.
    pub const fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Attempts consumed since the last reset.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the retry budget is spent.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.config.max_attempts > 0 && self.attempts >= self.config.max_attempts
    }

    /// Un-jittered delay for the given zero-based attempt.
    ///
    /// Multipliers below 1 are treated as 1 so delays never shrink.
    fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        #[allow(clippy::cast_precision_loss)]
        let initial_ms = self.config.initial_delay.as_millis() as f64;
        #[allow(clippy::cast_precision_loss)]
        let max_ms = self.config.max_delay.as_millis() as f64;

        let multiplier = self.config.multiplier.max(1.0);
        let scaled = (initial_ms * multiplier.powi(exponent)).round();
        if !scaled.is_finite() || scaled < 0.0 {
            return self.config.max_delay;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let millis = scaled.min(max_ms) as u64;
        Duration::from_millis(millis)
    }

    fn jitter(&self, delay: Duration) -> Duration {
        let factor = self.config.jitter_factor;
        if factor <= 0.0 {
            return delay;
        }
        let spread: f64 = rand::rng().random_range(-factor..=factor);
        delay.mul_f64((1.0 + spread).max(0.0))
    }
}
