//! Conditions and the single-attempt evaluator.
//!
//! A condition is any zero-argument check that either produces a value or
//! reports why it is not satisfied yet. Conditions must say "not yet"
//! explicitly through a retryable [`CheckError`]; a panic inside a condition
//! (for example a stray `assert!`) is treated as a bug and unwinds through
//! the poller instead of being retried until timeout.

use std::fmt::Debug;

use crate::result::CheckError;

/// A check evaluated repeatedly until it yields a value
pub trait Condition<T> {
    /// Run the check once
    fn check(&mut self) -> Result<T, CheckError>;

    /// Description used in logs and error messages
    fn description(&self) -> String {
        "condition".to_string()
    }
}

impl<T, F> Condition<T> for F
where
    F: FnMut() -> Result<T, CheckError>,
{
    fn check(&mut self) -> Result<T, CheckError> {
        self()
    }
}

/// A closure-based condition with a description
pub struct FnCondition<F> {
    func: F,
    description: String,
}

impl<F> Debug for FnCondition<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCondition")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<F> FnCondition<F> {
    /// Create a new described condition
    pub fn new(func: F, description: impl Into<String>) -> Self {
        Self {
            func,
            description: description.into(),
        }
    }
}

impl<T, F> Condition<T> for FnCondition<F>
where
    F: FnMut() -> Result<T, CheckError>,
{
    fn check(&mut self) -> Result<T, CheckError> {
        (self.func)()
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

/// Classified result of one evaluation
#[derive(Debug)]
pub enum Evaluation<T> {
    /// Condition satisfied
    Ready(T),
    /// Not satisfied yet, may be retried
    Retry(CheckError),
    /// Terminal failure, must not be retried
    Abort(CheckError),
}

impl<T> Evaluation<T> {
    /// Classify a raw check result
    #[must_use]
    pub fn classify(result: Result<T, CheckError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(e) if e.is_retryable() => Self::Retry(e),
            Err(e) => Self::Abort(e),
        }
    }

    /// Check if the condition was satisfied
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Evaluate a condition once and classify the outcome
pub fn evaluate<T, C: Condition<T> + ?Sized>(condition: &mut C) -> Evaluation<T> {
    Evaluation::classify(condition.check())
}

/// Not-yet unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), CheckError> {
    if condition {
        Ok(())
    } else {
        Err(CheckError::NotYet(message.into()))
    }
}

/// Mismatch unless `actual == expected`; returns the actual value on success
pub fn ensure_eq<T: PartialEq + Debug>(expected: &T, actual: T) -> Result<T, CheckError> {
    if actual == *expected {
        Ok(actual)
    } else {
        Err(CheckError::mismatch(expected, &actual))
    }
}

/// Absent unless the lookup produced something
pub fn present<T>(value: Option<T>, what: impl Into<String>) -> Result<T, CheckError> {
    value.ok_or_else(|| CheckError::Absent(format!("{} was not found", what.into())))
}
