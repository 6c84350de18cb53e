//! Reconnection backoff policy for progress subscribers
//!
//! Transport independent: a client asks the policy how long to wait before
//! the next attempt and gives up once it returns `None`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exponential backoff with a capped delay and a bounded attempt count
///
/// Delay for attempt `n` (1-based) is `min(base_delay * multiplier^n, cap)`.
/// With the defaults that is 2 s, 4 s, 8 s, 16 s, 30 s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub cap: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            cap: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before attempt `attempt` (1-based), or `None` when attempts are exhausted
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        let factor = self.multiplier.powi(attempt as i32);
        let millis = self.base_delay.as_millis() as f64 * factor;
        let cap_millis = self.cap.as_millis() as f64;

        Some(Duration::from_millis(millis.min(cap_millis) as u64))
    }
}

/// Attempt counter driven by a [`ReconnectPolicy`]
#[derive(Debug, Clone)]
pub struct ReconnectState {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl ReconnectState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// Record a failed connection and return how long to wait before retrying
    ///
    /// Returns `None` once the policy's attempt budget is used up.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let attempt = self.attempts.checked_add(1)?;
        let delay = self.policy.delay_for(attempt)?;
        self.attempts = attempt;
        Some(delay)
    }

    /// Successful connection: start counting from zero again
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }
}
