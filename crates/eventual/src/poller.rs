//! Poller / retry engine.
//!
//! Repeatedly evaluates a [`Condition`] under a [`PollPolicy`] until it is
//! satisfied, a terminal failure occurs, or the budget runs out. Attempts are
//! strictly sequential and separated by at least `policy.interval`. The budget
//! check runs before sleeping, so an exhausted poll reports the failure seen on
//! its final attempt (expected vs. actual), not a generic timeout.
//!
//! ```ignore
//! let poller = Poller::new(PollPolicy::api()).described("compound registered");
//! let id = poller.wait_for(|| present(lookup("CRA-1")?, "CRA-1"))?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::condition::Condition;
use crate::policy::PollPolicy;
use crate::result::{CheckError, WaitError, WaitResult};

/// Terminal result of one poll
#[derive(Debug)]
pub enum PollOutcome<T> {
    /// Condition produced a value
    Satisfied {
        /// Value returned by the condition
        value: T,
        /// Evaluations performed, including the successful one
        attempts: u32,
        /// Time from the first evaluation to success
        elapsed: Duration,
    },
    /// Budget ran out while the condition kept failing retryably
    Exhausted {
        /// What was being waited for
        description: String,
        /// Failure from the final attempt
        last: CheckError,
        /// Evaluations performed
        attempts: u32,
        /// Time spent polling
        elapsed: Duration,
    },
    /// Condition raised a terminal failure
    Aborted {
        /// What was being waited for
        description: String,
        /// The terminal failure
        error: CheckError,
        /// Evaluations performed, including the failing one
        attempts: u32,
    },
}

impl<T> PollOutcome<T> {
    /// Number of evaluations performed
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Satisfied { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Aborted { attempts, .. } => *attempts,
        }
    }

    /// Check if the condition was satisfied
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied { .. })
    }

    /// Convert into the value or the wait error
    pub fn into_result(self) -> WaitResult<T> {
        match self {
            Self::Satisfied { value, .. } => Ok(value),
            Self::Exhausted {
                description,
                last,
                attempts,
                elapsed,
            } => Err(WaitError::Timeout {
                description,
                attempts,
                elapsed,
                last,
            }),
            Self::Aborted {
                description,
                error,
                attempts,
            } => Err(WaitError::Aborted {
                description,
                attempt: attempts,
                source: error,
            }),
        }
    }
}

enum Step<T> {
    Done(PollOutcome<T>),
    Sleep(Duration),
}

/// Attempt bookkeeping shared by the blocking and async drivers
struct Attempts<'a> {
    policy: &'a PollPolicy,
    description: &'a str,
    count: u32,
}

impl<'a> Attempts<'a> {
    const fn new(policy: &'a PollPolicy, description: &'a str) -> Self {
        Self {
            policy,
            description,
            count: 0,
        }
    }

    fn record<T>(&mut self, result: Result<T, CheckError>, elapsed: Duration) -> Step<T> {
        self.count += 1;
        let attempt = self.count;
        match result {
            Ok(value) => {
                tracing::info!(
                    description = self.description,
                    attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "condition satisfied"
                );
                Step::Done(PollOutcome::Satisfied {
                    value,
                    attempts: attempt,
                    elapsed,
                })
            }
            Err(error) if !error.is_retryable() => {
                tracing::warn!(
                    description = self.description,
                    attempt,
                    %error,
                    "terminal failure while polling"
                );
                Step::Done(PollOutcome::Aborted {
                    description: self.description.to_string(),
                    error,
                    attempts: attempt,
                })
            }
            Err(last) if self.policy.is_exhausted(attempt, elapsed) => {
                tracing::warn!(
                    description = self.description,
                    attempts = attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %last,
                    "poll budget exhausted"
                );
                Step::Done(PollOutcome::Exhausted {
                    description: self.description.to_string(),
                    last,
                    attempts: attempt,
                    elapsed,
                })
            }
            Err(error) => {
                tracing::debug!(
                    description = self.description,
                    attempt,
                    %error,
                    "condition not met yet"
                );
                Step::Sleep(self.policy.interval)
            }
        }
    }
}

/// Blocking poller bound to a policy and a clock
#[derive(Debug, Clone)]
pub struct Poller<C = SystemClock> {
    policy: PollPolicy,
    clock: C,
    description: Option<String>,
}

impl Poller<SystemClock> {
    /// Create a poller on the system clock
    #[must_use]
    pub fn new(policy: PollPolicy) -> Self {
        Self::with_clock(policy, SystemClock::new())
    }
}

impl<C: Clock> Poller<C> {
    /// Create a poller on a custom clock
    #[must_use]
    pub fn with_clock(policy: PollPolicy, clock: C) -> Self {
        Self {
            policy,
            clock,
            description: None,
        }
    }

    /// Override the description reported in logs and errors
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The policy this poller runs under
    #[must_use]
    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Poll until a terminal outcome.
    ///
    /// Errors only when the policy has no budget.
    pub fn poll<T, K>(&self, condition: &mut K) -> WaitResult<PollOutcome<T>>
    where
        K: Condition<T> + ?Sized,
    {
        self.policy.validate()?;
        let description = self
            .description
            .clone()
            .unwrap_or_else(|| condition.description());
        let mut attempts = Attempts::new(&self.policy, &description);
        let start = self.clock.now();

        loop {
            let result = condition.check();
            let elapsed = self.clock.now().saturating_sub(start);
            match attempts.record(result, elapsed) {
                Step::Done(outcome) => return Ok(outcome),
                Step::Sleep(interval) => self.clock.sleep(interval),
            }
        }
    }

    /// Block until `condition` yields a value.
    ///
    /// Returns [`WaitError::Timeout`] carrying the last failure when the budget
    /// runs out, and [`WaitError::Aborted`] as soon as a terminal failure is
    /// seen.
    pub fn wait_for<T, K>(&self, mut condition: K) -> WaitResult<T>
    where
        K: Condition<T>,
    {
        self.poll(&mut condition)?.into_result()
    }
}

/// Block until `condition` yields a value, on the system clock
pub fn wait_for<T, K>(condition: K, policy: PollPolicy) -> WaitResult<T>
where
    K: Condition<T>,
{
    Poller::new(policy).wait_for(condition)
}

/// Async counterpart of [`Poller::wait_for`] driven by `tokio::time`.
///
/// Attempts are still sequential; the future returned by `condition` is
/// awaited to completion before the budget is checked.
pub async fn wait_for_async<T, F, Fut>(
    policy: PollPolicy,
    description: &str,
    mut condition: F,
) -> WaitResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CheckError>>,
{
    policy.validate()?;
    let mut attempts = Attempts::new(&policy, description);
    let start = tokio::time::Instant::now();

    loop {
        let result = condition().await;
        match attempts.record(result, start.elapsed()) {
            Step::Done(outcome) => return outcome.into_result(),
            Step::Sleep(interval) => tokio::time::sleep(interval).await,
        }
    }
}
