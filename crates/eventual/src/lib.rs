//! Eventual: eventual-consistency waits for end-to-end tests
//!
//! Integration tests against browser UIs and REST backends observe state that
//! converges asynchronously: grids finish computing, spinners disappear,
//! freshly posted resources become queryable. This crate turns "check, and if
//! it is not true yet try again later" into one reusable poller with an
//! explicit retry signal and a bounded budget.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────────────┐
//! │  Condition   │───►│    Poller    │───►│  Wait specializations │
//! │  (evaluator) │    │ (retry loop) │    │  visible / title / …  │
//! └──────────────┘    └──────┬───────┘    └──────────┬───────────┘
//!                            │                       │
//!                     ┌──────▼──────┐         ┌──────▼──────┐
//!                     │ PollPolicy  │         │ PageDriver  │
//!                     │ + Clock     │         │ / ApiClient │
//!                     └─────────────┘         └─────────────┘
//! ```
//!
//! A condition returns `Ok(value)` when satisfied, a retryable
//! [`CheckError`] when the system has not caught up yet, and a terminal one
//! when waiting longer cannot help. On timeout the error carries the failure
//! observed on the final attempt.

#![warn(missing_docs)]

/// Bounded fan-out of independent async jobs
pub mod batch;

/// Clock abstraction and fake clock for deterministic timing tests
pub mod clock;

/// Conditions and the single-attempt evaluator
pub mod condition;

/// Wait settings from YAML and environment variables
#[allow(clippy::missing_errors_doc)]
pub mod config;

/// Page driver capability and element snapshots
pub mod driver;

/// Selectors and named locators
pub mod locator;

/// Tracing subscriber setup
pub mod logging;

/// Scripted page driver for tests
pub mod mock;

/// Interval and budget for one wait
pub mod policy;

/// The retry engine
#[allow(clippy::missing_errors_doc)]
pub mod poller;

/// Error taxonomy and retry classification
pub mod result;

/// Scoped acquisition of driver state (iframes)
pub mod scope;

/// Wait specializations built on the poller
#[allow(clippy::missing_errors_doc)]
pub mod wait;

/// JSON REST client for API-level waits
#[cfg(feature = "api")]
#[allow(clippy::missing_errors_doc)]
pub mod api;

#[cfg(feature = "api")]
pub use api::ApiClient;
pub use batch::{run_batch, BatchReport, Timed};
pub use clock::{Clock, FakeClock, SystemClock};
pub use condition::{ensure, ensure_eq, evaluate, present, Condition, Evaluation, FnCondition};
pub use config::WaitSettings;
pub use driver::{ElementHandle, PageDriver};
pub use locator::{Locator, Selector};
pub use logging::{init_logging, init_logging_with, LogFormat};
pub use mock::MockDriver;
pub use policy::PollPolicy;
pub use poller::{wait_for, wait_for_async, PollOutcome, Poller};
#[cfg(feature = "api")]
pub use result::ApiError;
pub use result::{CheckError, ConfigError, DriverError, WaitError, WaitResult};
pub use scope::{with_context, ContextGuard, FrameContext, ScopedContext};
pub use wait::{
    wait_until_count, wait_until_equal, wait_until_not_visible, wait_until_text,
    wait_until_title, wait_until_visible, TitleMatch, Waiter,
};

/// Commonly used items
pub mod prelude {
    #[cfg(feature = "api")]
    pub use super::ApiClient;
    pub use super::{
        ensure, ensure_eq, present, wait_for, wait_for_async, wait_until_count,
        wait_until_equal, wait_until_not_visible, wait_until_text, wait_until_title,
        wait_until_visible, CheckError, Locator, PageDriver, PollPolicy, Poller, Selector,
        TitleMatch, WaitError, WaitResult, WaitSettings,
    };
}
