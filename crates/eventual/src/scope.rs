//! Scoped acquisition of driver state.
//!
//! Some waits only make sense inside a temporary context, most commonly an
//! iframe. A [`ContextGuard`] enters the context on creation and restores it
//! when dropped, so the restore runs on normal return, on `?` early exits and
//! while unwinding from a panic.

use std::ops::Deref;

use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::result::DriverError;

/// A temporary context that must be undone
pub trait ScopedContext {
    /// Error raised when the context cannot be entered
    type Error;

    /// Enter the context
    ///
    /// # Errors
    ///
    /// Returns an error if the context could not be entered; `restore` is
    /// not called in that case.
    fn enter(&mut self) -> Result<(), Self::Error>;

    /// Undo `enter`. Must not panic.
    fn restore(&mut self);
}

/// RAII guard that restores its context on drop
pub struct ContextGuard<'a, S: ScopedContext + ?Sized> {
    context: &'a mut S,
}

impl<'a, S: ScopedContext + ?Sized> ContextGuard<'a, S> {
    /// Enter `context`, returning a guard that restores it
    ///
    /// # Errors
    ///
    /// Propagates the failure from [`ScopedContext::enter`].
    pub fn enter(context: &'a mut S) -> Result<Self, S::Error> {
        context.enter()?;
        Ok(Self { context })
    }
}

impl<S: ScopedContext + ?Sized> Deref for ContextGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.context
    }
}

impl<S: ScopedContext + ?Sized> Drop for ContextGuard<'_, S> {
    fn drop(&mut self) {
        self.context.restore();
    }
}

impl<S: ScopedContext + std::fmt::Debug + ?Sized> std::fmt::Debug for ContextGuard<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextGuard")
            .field("context", &self.context)
            .finish()
    }
}

/// Run `f` inside `context`, restoring it on every exit path
///
/// # Errors
///
/// Returns the context's error if it could not be entered; `f` is not run.
pub fn with_context<S, R, F>(mut context: S, f: F) -> Result<R, S::Error>
where
    S: ScopedContext,
    F: FnOnce(&S) -> R,
{
    let guard = ContextGuard::enter(&mut context)?;
    Ok(f(&guard))
}

/// Iframe context on a page driver
#[derive(Debug, Clone)]
pub struct FrameContext<D> {
    driver: D,
    frame: Selector,
}

impl<D: PageDriver> FrameContext<D> {
    /// Context for the iframe matched by `frame`
    #[must_use]
    pub fn new(driver: D, frame: impl Into<Selector>) -> Self {
        Self {
            driver,
            frame: frame.into(),
        }
    }

    /// Driver to use while inside the frame
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Selector of the frame element
    #[must_use]
    pub const fn frame(&self) -> &Selector {
        &self.frame
    }
}

impl<D: PageDriver> ScopedContext for FrameContext<D> {
    type Error = DriverError;

    fn enter(&mut self) -> Result<(), DriverError> {
        tracing::debug!(frame = %self.frame, "entering frame");
        self.driver.enter_frame(&self.frame)
    }

    fn restore(&mut self) {
        if let Err(error) = self.driver.parent_frame() {
            tracing::warn!(frame = %self.frame, %error, "failed to return to parent frame");
        }
    }
}
