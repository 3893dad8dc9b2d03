//! Clock abstraction for the poller.
//!
//! Polling only needs two things from time: how long it has been since the
//! poll started, and a way to block between attempts. [`SystemClock`] uses
//! the real monotonic clock; [`FakeClock`] is a manually driven clock for
//! deterministic tests of timing behaviour.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Source of elapsed time and blocking sleeps
pub trait Clock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;

    /// Block the current thread for `duration`
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Real monotonic clock with blocking sleeps
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Default)]
struct FakeClockState {
    now_us: AtomicU64,
    sleeps: Mutex<Vec<Duration>>,
}

/// Manually driven clock for deterministic tests
///
/// `sleep` returns immediately and advances virtual time by the requested
/// duration. Clones share the same timeline, so a condition can call
/// [`FakeClock::advance`] to model its own evaluation cost.
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    state: Arc<FakeClockState>,
}

impl FakeClock {
    /// Create a clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        let _ = self
            .state
            .now_us
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }

    /// Sleeps requested so far, in order
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state
            .sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of sleeps requested so far
    #[must_use]
    pub fn sleep_count(&self) -> usize {
        self.state
            .sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.state.now_us.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.state
            .sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        self.advance(duration);
    }
}
