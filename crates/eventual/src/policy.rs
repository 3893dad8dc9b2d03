//! Poll policy: interval and budget for one wait.
//!
//! A policy bounds a poll by attempt count, by wall-clock timeout, or by
//! both (whichever runs out first). It is `Copy` and never mutated while a
//! poll is running.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::result::{WaitError, WaitResult};

/// Default UI timeout (60 seconds); grid computation and plot rendering are slow
pub const DEFAULT_UI_TIMEOUT_MS: u64 = 60_000;

/// Default UI polling interval (1 second)
pub const DEFAULT_UI_INTERVAL_MS: u64 = 1_000;

/// Default API timeout (10 seconds)
pub const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;

/// Default API polling interval (500ms)
pub const DEFAULT_API_INTERVAL_MS: u64 = 500;

/// Interval and budget for a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Pause between attempts
    #[serde(rename = "interval_ms", with = "millis")]
    pub interval: Duration,
    /// Maximum number of evaluations (0 and 1 both mean "evaluate once")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Wall-clock budget
    #[serde(
        rename = "timeout_ms",
        default,
        with = "opt_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::ui()
    }
}

impl PollPolicy {
    /// Policy for UI state: long timeout, one-second interval
    #[must_use]
    pub const fn ui() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_UI_INTERVAL_MS),
            max_attempts: None,
            timeout: Some(Duration::from_millis(DEFAULT_UI_TIMEOUT_MS)),
        }
    }

    /// Policy for API state: shorter timeout, faster polling
    #[must_use]
    pub const fn api() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_API_INTERVAL_MS),
            max_attempts: None,
            timeout: Some(Duration::from_millis(DEFAULT_API_TIMEOUT_MS)),
        }
    }

    /// Attempt-count budget only
    #[must_use]
    pub const fn attempts(max_attempts: u32, interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
            timeout: None,
        }
    }

    /// Timeout budget only
    #[must_use]
    pub const fn timeout(timeout: Duration, interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            timeout: Some(timeout),
        }
    }

    /// Evaluate exactly once, never sleep
    #[must_use]
    pub const fn once() -> Self {
        Self::attempts(1, Duration::ZERO)
    }

    /// Set the interval between attempts
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the attempt budget
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the wall-clock budget
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Drop the wall-clock budget
    #[must_use]
    pub const fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Reject policies that cannot terminate.
    ///
    /// A timeout-only policy with a zero interval is rejected too: on a
    /// virtual clock time would never advance between attempts.
    pub fn validate(&self) -> WaitResult<()> {
        if self.max_attempts.is_none() && self.timeout.is_none() {
            return Err(WaitError::InvalidPolicy(
                "neither max_attempts nor timeout is set".to_string(),
            ));
        }
        if self.max_attempts.is_none() && self.interval.is_zero() {
            return Err(WaitError::InvalidPolicy(
                "timeout-only policy needs a non-zero interval".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the attempt that just failed was the last one allowed.
    ///
    /// Evaluated before sleeping: for a timeout budget the next attempt must
    /// start strictly before the deadline, otherwise the current failure is
    /// final and no trailing sleep happens.
    #[must_use]
    pub fn is_exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        if let Some(max) = self.max_attempts {
            if attempts >= max.max(1) {
                return true;
            }
        }
        if let Some(timeout) = self.timeout {
            if elapsed.saturating_add(self.interval) >= timeout {
                return true;
            }
        }
        false
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod opt_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}
