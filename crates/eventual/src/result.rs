//! Result and error types for eventual.
//!
//! Every failure a condition can produce is classified as either retryable
//! ("the system under test has not caught up yet") or terminal ("waiting
//! longer will not help"). The classification lives in one place,
//! [`CheckError::is_retryable`], so the poller never has to guess from an
//! error's type.

use std::time::Duration;
use thiserror::Error;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Outcome of one failed condition evaluation
#[derive(Debug, Error)]
pub enum CheckError {
    /// Explicit "not yet" signal from a condition body
    #[error("{0}")]
    NotYet(String),

    /// Observed value differs from the expected one
    #[error("expected {expected}, got {actual}")]
    Mismatch {
        /// Expected value (Debug-rendered)
        expected: String,
        /// Last observed value (Debug-rendered)
        actual: String,
    },

    /// A lookup returned nothing yet
    #[error("{0}")]
    Absent(String),

    /// Non-retryable failure raised by the condition itself
    #[error("{0}")]
    Fatal(String),

    /// Page driver failure, classified by [`DriverError::is_retryable`]
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// REST client failure, classified by `ApiError::is_retryable`
    #[cfg(feature = "api")]
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CheckError {
    /// Create a "not yet" failure
    #[must_use]
    pub fn not_yet(message: impl Into<String>) -> Self {
        Self::NotYet(message.into())
    }

    /// Create a terminal failure
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    /// Create a mismatch failure from two Debug-printable values
    #[must_use]
    pub fn mismatch<E: std::fmt::Debug + ?Sized, A: std::fmt::Debug + ?Sized>(
        expected: &E,
        actual: &A,
    ) -> Self {
        Self::Mismatch {
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        }
    }

    /// Whether the poller may retry after this failure
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotYet(_) | Self::Mismatch { .. } | Self::Absent(_) => true,
            Self::Fatal(_) => false,
            Self::Driver(e) => e.is_retryable(),
            #[cfg(feature = "api")]
            Self::Api(e) => e.is_retryable(),
        }
    }
}

/// Errors reported by a [`PageDriver`](crate::driver::PageDriver)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// Lookup matched nothing
    #[error("no such element: {selector}")]
    NoSuchElement {
        /// Selector that was queried
        selector: String,
    },

    /// Element was detached from the DOM between lookup and use
    #[error("stale element reference: {id}")]
    StaleElement {
        /// Element identifier
        id: String,
    },

    /// Frame could not be entered
    #[error("no such frame: {selector}")]
    NoSuchFrame {
        /// Selector of the frame element
        selector: String,
    },

    /// Selector is malformed
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// Browser session is gone or unusable
    #[error("session error: {0}")]
    Session(String),

    /// Communication with the browser failed
    #[error("transport error: {0}")]
    Transport(String),
}

impl DriverError {
    /// Lookup misses and stale references are timing artefacts; everything
    /// else is a broken session or a broken test.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoSuchElement { .. } | Self::StaleElement { .. } | Self::NoSuchFrame { .. }
        )
    }
}

/// Errors reported by [`ApiClient`](crate::api::ApiClient)
#[cfg(feature = "api")]
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be sent or the connection failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("API error {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Response body was not the expected JSON shape
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(feature = "api")]
impl ApiError {
    /// 404 means the resource is not visible yet and 503 means the server is
    /// still processing; auth failures, other statuses and transport errors
    /// are terminal.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Status { status: 404 | 503, .. })
    }

    /// Status code when the server answered
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors that terminate a wait
#[derive(Debug, Error)]
pub enum WaitError {
    /// Budget exhausted while the last failure was retryable
    #[error("{description} not met after {attempts} attempt(s) ({:.2}s): {last}", .elapsed.as_secs_f64())]
    Timeout {
        /// What was being waited for
        description: String,
        /// Number of evaluations performed
        attempts: u32,
        /// Time spent polling
        elapsed: Duration,
        /// Failure observed on the final attempt
        #[source]
        last: CheckError,
    },

    /// Terminal failure, propagated without further retries
    #[error("{description} aborted on attempt {attempt}: {source}")]
    Aborted {
        /// What was being waited for
        description: String,
        /// Attempt that raised the failure
        attempt: u32,
        /// The terminal failure
        #[source]
        source: CheckError,
    },

    /// Policy cannot bound the poll
    #[error("invalid poll policy: {0}")]
    InvalidPolicy(String),
}

impl WaitError {
    /// Failure carried by a timeout or abort
    #[must_use]
    pub const fn last_failure(&self) -> Option<&CheckError> {
        match self {
            Self::Timeout { last, .. } => Some(last),
            Self::Aborted { source, .. } => Some(source),
            Self::InvalidPolicy(_) => None,
        }
    }

    /// Check if the wait ran out of budget
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors loading wait settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Environment override could not be parsed
    #[error("invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name
        name: String,
        /// Raw value
        value: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod classification_tests {
        use super::*;

        #[test]
        fn test_timing_failures_are_retryable() {
            assert!(CheckError::not_yet("rows still computing").is_retryable());
            assert!(CheckError::mismatch(&5, &3).is_retryable());
            assert!(CheckError::Absent("no row".into()).is_retryable());
        }

        #[test]
        fn test_fatal_is_terminal() {
            assert!(!CheckError::fatal("bad argument").is_retryable());
        }

        #[test]
        fn test_driver_classification() {
            let missing = DriverError::NoSuchElement {
                selector: "#grid".into(),
            };
            assert!(CheckError::from(missing).is_retryable());

            let stale = DriverError::StaleElement { id: "e1".into() };
            assert!(CheckError::from(stale).is_retryable());

            assert!(!CheckError::from(DriverError::Session("closed".into())).is_retryable());
            assert!(!CheckError::from(DriverError::Transport("reset".into())).is_retryable());
            assert!(!CheckError::from(DriverError::InvalidSelector("[[".into())).is_retryable());
        }

        #[cfg(feature = "api")]
        #[test]
        fn test_api_classification() {
            let status = |status| ApiError::Status {
                status,
                body: String::new(),
            };
            assert!(status(404).is_retryable());
            assert!(status(503).is_retryable());
            assert!(!status(401).is_retryable());
            assert!(!status(403).is_retryable());
            assert!(!status(500).is_retryable());
            assert_eq!(status(404).status(), Some(404));
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn test_mismatch_display() {
            let err = CheckError::mismatch(&5, &3);
            assert_eq!(err.to_string(), "expected 5, got 3");
        }

        #[test]
        fn test_mismatch_display_strings() {
            let err = CheckError::mismatch("Done", "Pending");
            assert_eq!(err.to_string(), "expected \"Done\", got \"Pending\"");
        }

        #[test]
        fn test_timeout_embeds_last_failure() {
            let err = WaitError::Timeout {
                description: "row count".into(),
                attempts: 4,
                elapsed: Duration::from_millis(750),
                last: CheckError::mismatch(&10, &7),
            };
            let display = err.to_string();
            assert!(display.contains("row count"));
            assert!(display.contains("4 attempt(s)"));
            assert!(display.contains("expected 10, got 7"));
            assert!(err.is_timeout());
        }

        #[test]
        fn test_aborted_display() {
            let err = WaitError::Aborted {
                description: "grid".into(),
                attempt: 1,
                source: CheckError::fatal("session closed"),
            };
            assert!(err.to_string().contains("session closed"));
            assert!(!err.is_timeout());
            assert!(err.last_failure().is_some());
        }

        #[test]
        fn test_invalid_policy_has_no_failure() {
            let err = WaitError::InvalidPolicy("no budget".into());
            assert!(err.last_failure().is_none());
        }
    }
}
