//! Sliding-window rate-limit decisions.
//!
//! Counters and timestamps live in an external store keyed by
//! [`rate_limit_key`]; these functions only read the values they are given.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store key for an `(action, identifier)` counter
pub fn rate_limit_key(identifier: &str, action: &str) -> String {
    format!("rate_limit:{action}:{identifier}")
}

/// Limited iff the last attempt is still inside the window and the count has
/// reached the threshold. Once the window has elapsed the count is ignored.
pub fn is_rate_limited(
    attempts: u32,
    max_attempts: u32,
    window: Duration,
    last_attempt: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    let elapsed = now.signed_duration_since(last_attempt);
    if elapsed > window {
        return false;
    }
    attempts >= max_attempts
}

/// Outcome of evaluating a [`RateLimitPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_limited(&self) -> bool {
        matches!(self, RateLimitDecision::Limited { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("rate-limit window must not be negative, got {0} ms")]
    NegativeWindow(i64),

    #[error("rate-limit window of {0} ms is out of range")]
    WindowOutOfRange(i64),
}

#[derive(Serialize, Deserialize)]
struct PolicyFields {
    max_attempts: u32,
    window_ms: i64,
}

/// Threshold and window for one action; the window is never negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyFields", into = "PolicyFields")]
pub struct RateLimitPolicy {
    max_attempts: u32,
    window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_attempts: u32, window: Duration) -> Result<Self, RateLimitError> {
        if window < Duration::zero() {
            return Err(RateLimitError::NegativeWindow(window.num_milliseconds()));
        }
        Ok(Self { max_attempts, window })
    }

    pub fn from_millis(max_attempts: u32, window_ms: i64) -> Result<Self, RateLimitError> {
        let window = Duration::try_milliseconds(window_ms).ok_or(RateLimitError::WindowOutOfRange(window_ms))?;
        Self::new(max_attempts, window)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// `retry_after` is clamped to `0..=window`
    pub fn evaluate(&self, attempts: u32, last_attempt: DateTime<Utc>, now: DateTime<Utc>) -> RateLimitDecision {
        if !is_rate_limited(attempts, self.max_attempts, self.window, last_attempt, now) {
            return RateLimitDecision::Allowed;
        }
        let elapsed = now.signed_duration_since(last_attempt).max(Duration::zero());
        let retry_after = self
            .window
            .checked_sub(&elapsed)
            .unwrap_or_else(Duration::zero)
            .clamp(Duration::zero(), self.window);
        RateLimitDecision::Limited { retry_after }
    }
}

impl TryFrom<PolicyFields> for RateLimitPolicy {
    type Error = RateLimitError;

    fn try_from(fields: PolicyFields) -> Result<Self, Self::Error> {
        Self::from_millis(fields.max_attempts, fields.window_ms)
    }
}

impl From<RateLimitPolicy> for PolicyFields {
    fn from(policy: RateLimitPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts,
            window_ms: policy.window.num_milliseconds(),
        }
    }
}

impl Default for RateLimitPolicy {
    /// Five attempts per minute
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::seconds(60),
        }
    }
}
