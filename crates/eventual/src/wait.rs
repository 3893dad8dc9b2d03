//! Wait specializations for page-driven tests.
//!
//! Each wait is a thin layer over [`Poller`]: it turns one observation of the
//! page into a [`CheckError`] describing what is still wrong, and lets the
//! poller decide whether to try again. Lookup misses and hidden elements are
//! "not yet"; broken sessions and malformed selectors abort immediately.
//!
//! ```ignore
//! let grid = Locator::new("#lr-grid .row").named("LiveReport rows");
//! let rows = wait_until_count(&driver, &grid, 3, PollPolicy::ui())?;
//! wait_until_not_visible(&driver, &Locator::new(".spinner"), PollPolicy::ui())?;
//! ```

use std::fmt;
use std::fmt::Debug;

use regex::Regex;

use crate::clock::{Clock, SystemClock};
use crate::condition::{ensure_eq, FnCondition};
use crate::driver::{ElementHandle, PageDriver};
use crate::locator::{Locator, Selector};
use crate::policy::PollPolicy;
use crate::poller::Poller;
use crate::result::{CheckError, DriverError, WaitResult};

// =============================================================================
// TITLE MATCHING
// =============================================================================

/// How a document title is compared
#[derive(Debug, Clone)]
pub enum TitleMatch {
    /// Title equals the string
    Exact(String),
    /// Title contains the string
    Contains(String),
    /// Title matches the regular expression
    Regex(Regex),
}

impl TitleMatch {
    /// Match the whole title
    #[must_use]
    pub fn exact(title: impl Into<String>) -> Self {
        Self::Exact(title.into())
    }

    /// Match a substring of the title
    #[must_use]
    pub fn contains(fragment: impl Into<String>) -> Self {
        Self::Contains(fragment.into())
    }

    /// Match a regular expression
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Regex)
    }

    /// Check a title against this matcher
    #[must_use]
    pub fn matches(&self, title: &str) -> bool {
        match self {
            Self::Exact(expected) => title == expected,
            Self::Contains(fragment) => title.contains(fragment.as_str()),
            Self::Regex(re) => re.is_match(title),
        }
    }
}

impl fmt::Display for TitleMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(expected) => write!(f, "title == {expected:?}"),
            Self::Contains(fragment) => write!(f, "title contains {fragment:?}"),
            Self::Regex(re) => write!(f, "title matches /{}/", re.as_str()),
        }
    }
}

// =============================================================================
// OBSERVATIONS
// =============================================================================

/// Elements matching `selector`, treating a lookup miss as an empty match
fn lookup<D: PageDriver>(driver: &D, selector: &Selector) -> Result<Vec<ElementHandle>, CheckError> {
    match driver.find_elements(selector) {
        Ok(elements) => Ok(elements),
        Err(DriverError::NoSuchElement { .. }) => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn first_visible<D: PageDriver>(driver: &D, selector: &Selector) -> Result<ElementHandle, CheckError> {
    let elements = lookup(driver, selector)?;
    if elements.is_empty() {
        return Err(CheckError::Absent(format!(
            "No element matching selector `{selector}` was found."
        )));
    }
    elements.into_iter().find(ElementHandle::is_visible).ok_or_else(|| {
        CheckError::not_yet(format!(
            "An element matching selector `{selector}` was found, but it was not displayed."
        ))
    })
}

fn none_visible<D: PageDriver>(driver: &D, selector: &Selector) -> Result<(), CheckError> {
    if lookup(driver, selector)?.iter().any(ElementHandle::is_visible) {
        return Err(CheckError::not_yet(format!(
            "A visible element matching selector `{selector}` was found."
        )));
    }
    Ok(())
}

fn exact_count<D: PageDriver>(
    driver: &D,
    selector: &Selector,
    expected: usize,
) -> Result<Vec<ElementHandle>, CheckError> {
    let elements = lookup(driver, selector)?;
    if elements.len() == expected {
        return Ok(elements);
    }
    Err(CheckError::Mismatch {
        expected: format!("{expected} element(s) matching `{selector}`"),
        actual: elements.len().to_string(),
    })
}

fn visible_with_text<D: PageDriver>(
    driver: &D,
    selector: &Selector,
    expected: &str,
) -> Result<ElementHandle, CheckError> {
    let element = first_visible(driver, selector)?;
    if element.text() == expected {
        Ok(element)
    } else {
        Err(CheckError::mismatch(expected, element.text()))
    }
}

fn title_matching<D: PageDriver>(driver: &D, matcher: &TitleMatch) -> Result<String, CheckError> {
    let title = driver.title()?;
    if matcher.matches(&title) {
        Ok(title)
    } else {
        Err(CheckError::Mismatch {
            expected: matcher.to_string(),
            actual: format!("{title:?}"),
        })
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Page waits bound to a driver and a poller
#[derive(Debug, Clone)]
pub struct Waiter<D, C = SystemClock> {
    driver: D,
    poller: Poller<C>,
}

impl<D: PageDriver> Waiter<D> {
    /// Create a waiter on the system clock
    #[must_use]
    pub fn new(driver: D, policy: PollPolicy) -> Self {
        Self::with_poller(driver, Poller::new(policy))
    }
}

impl<D: PageDriver, C: Clock> Waiter<D, C> {
    /// Create a waiter with a preconfigured poller
    #[must_use]
    pub const fn with_poller(driver: D, poller: Poller<C>) -> Self {
        Self { driver, poller }
    }

    /// The driver being observed
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Wait until an element matching `locator` is displayed and return it
    pub fn until_visible(&self, locator: &Locator) -> WaitResult<ElementHandle> {
        let selector = locator.selector();
        self.poller.wait_for(FnCondition::new(
            || first_visible(&self.driver, selector),
            format!("{locator} visible"),
        ))
    }

    /// Wait until no displayed element matches `locator`
    pub fn until_not_visible(&self, locator: &Locator) -> WaitResult<()> {
        let selector = locator.selector();
        self.poller.wait_for(FnCondition::new(
            || none_visible(&self.driver, selector),
            format!("{locator} not visible"),
        ))
    }

    /// Wait until exactly `count` elements match `locator`
    pub fn until_count(&self, locator: &Locator, count: usize) -> WaitResult<Vec<ElementHandle>> {
        let selector = locator.selector();
        self.poller.wait_for(FnCondition::new(
            || exact_count(&self.driver, selector, count),
            format!("{locator} count == {count}"),
        ))
    }

    /// Wait until the first displayed match of `locator` has text `expected`
    pub fn until_text(&self, locator: &Locator, expected: &str) -> WaitResult<ElementHandle> {
        let selector = locator.selector();
        self.poller.wait_for(FnCondition::new(
            || visible_with_text(&self.driver, selector, expected),
            format!("{locator} text == {expected:?}"),
        ))
    }

    /// Wait until the document title satisfies `matcher`
    pub fn until_title(&self, matcher: &TitleMatch) -> WaitResult<String> {
        self.poller.wait_for(FnCondition::new(
            || title_matching(&self.driver, matcher),
            matcher.to_string(),
        ))
    }

    /// Wait until a value read from the driver equals `expected`
    pub fn until_equal<T, F>(&self, mut accessor: F, expected: &T) -> WaitResult<T>
    where
        T: PartialEq + Debug,
        F: FnMut(&D) -> Result<T, CheckError>,
    {
        self.poller.wait_for(FnCondition::new(
            || ensure_eq(expected, accessor(&self.driver)?),
            format!("value == {expected:?}"),
        ))
    }
}

// =============================================================================
// FREE FUNCTIONS
// =============================================================================

/// Wait until an element matching `locator` is displayed
pub fn wait_until_visible<D: PageDriver>(
    driver: D,
    locator: &Locator,
    policy: PollPolicy,
) -> WaitResult<ElementHandle> {
    Waiter::new(driver, policy).until_visible(locator)
}

/// Wait until no displayed element matches `locator`
pub fn wait_until_not_visible<D: PageDriver>(
    driver: D,
    locator: &Locator,
    policy: PollPolicy,
) -> WaitResult<()> {
    Waiter::new(driver, policy).until_not_visible(locator)
}

/// Wait until exactly `count` elements match `locator`
pub fn wait_until_count<D: PageDriver>(
    driver: D,
    locator: &Locator,
    count: usize,
    policy: PollPolicy,
) -> WaitResult<Vec<ElementHandle>> {
    Waiter::new(driver, policy).until_count(locator, count)
}

/// Wait until the first displayed match of `locator` has text `expected`
pub fn wait_until_text<D: PageDriver>(
    driver: D,
    locator: &Locator,
    expected: &str,
    policy: PollPolicy,
) -> WaitResult<ElementHandle> {
    Waiter::new(driver, policy).until_text(locator, expected)
}

/// Wait until the document title satisfies `matcher`
pub fn wait_until_title<D: PageDriver>(
    driver: D,
    matcher: &TitleMatch,
    policy: PollPolicy,
) -> WaitResult<String> {
    Waiter::new(driver, policy).until_title(matcher)
}

/// Wait until `accessor` returns `expected`; returns the matching value.
///
/// On timeout the error carries both the expected value and the value seen
/// on the final attempt.
pub fn wait_until_equal<T, F>(mut accessor: F, expected: T, policy: PollPolicy) -> WaitResult<T>
where
    T: PartialEq + Debug,
    F: FnMut() -> Result<T, CheckError>,
{
    let description = format!("value == {expected:?}");
    Poller::new(policy).wait_for(FnCondition::new(
        move || ensure_eq(&expected, accessor()?),
        description,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::mock::MockDriver;
    use crate::result::WaitError;
    use std::cell::Cell;
    use std::time::Duration;

    fn waiter(driver: &MockDriver, max_attempts: u32) -> (Waiter<&MockDriver, FakeClock>, FakeClock) {
        let clock = FakeClock::new();
        let poller = Poller::with_clock(
            PollPolicy::attempts(max_attempts, Duration::from_millis(100)),
            clock.clone(),
        );
        (Waiter::with_poller(driver, poller), clock)
    }

    fn row(id: &str) -> ElementHandle {
        ElementHandle::new(id, "tr")
    }

    fn last_message(err: &WaitError) -> String {
        err.last_failure().unwrap().to_string()
    }

    mod visible_tests {
        use super::*;

        #[test]
        fn test_appears_on_third_lookup() {
            let driver = MockDriver::new();
            let _ = driver.script(".row", [vec![], vec![], vec![row("r1")]]);
            let (waiter, clock) = waiter(&driver, 5);

            let el = waiter.until_visible(&Locator::new(".row")).unwrap();
            assert_eq!(el.id, "r1");
            assert_eq!(driver.lookup_count(&Selector::css(".row")), 3);
            assert_eq!(clock.sleep_count(), 2);
        }

        #[test]
        fn test_missing_element_message() {
            let driver = MockDriver::new();
            let (waiter, _clock) = waiter(&driver, 3);
            let err = waiter.until_visible(&Locator::new("#save")).unwrap_err();
            assert!(err.is_timeout());
            assert_eq!(
                last_message(&err),
                "No element matching selector `#save` was found."
            );
        }

        #[test]
        fn test_timeout_budget_missing_element() {
            let driver = MockDriver::new();
            let clock = FakeClock::new();
            let poller = Poller::with_clock(
                PollPolicy::timeout(Duration::from_secs(1), Duration::from_millis(250)),
                clock.clone(),
            );
            let waiter = Waiter::with_poller(&driver, poller);

            let err = waiter.until_visible(&Locator::new("#save")).unwrap_err();
            assert!(matches!(err, WaitError::Timeout { attempts: 4, .. }));
            assert_eq!(driver.lookup_count(&Selector::css("#save")), 4);
            assert_eq!(clock.now(), Duration::from_millis(750));
            assert_eq!(
                last_message(&err),
                "No element matching selector `#save` was found."
            );
        }

        #[test]
        fn test_hidden_element_message() {
            let driver = MockDriver::new();
            let _ = driver.set_elements("#save", vec![ElementHandle::new("b1", "button").hidden()]);
            let (waiter, _clock) = waiter(&driver, 2);
            let err = waiter.until_visible(&Locator::new("#save")).unwrap_err();
            assert_eq!(
                last_message(&err),
                "An element matching selector `#save` was found, but it was not displayed."
            );
        }

        #[test]
        fn test_picks_first_displayed() {
            let driver = MockDriver::new();
            let _ = driver.set_elements(
                "button",
                vec![
                    ElementHandle::new("b1", "button").hidden(),
                    ElementHandle::new("b2", "button"),
                ],
            );
            let (waiter, _clock) = waiter(&driver, 1);
            assert_eq!(waiter.until_visible(&Locator::new("button")).unwrap().id, "b2");
        }

        #[test]
        fn test_stale_reference_is_retried() {
            let driver = MockDriver::new();
            let _ = driver
                .set_elements(".row", vec![row("r2")])
                .fail_next(".row", DriverError::StaleElement { id: "r1".into() });
            let (waiter, _clock) = waiter(&driver, 3);
            assert_eq!(waiter.until_visible(&Locator::new(".row")).unwrap().id, "r2");
        }

        #[test]
        fn test_lookup_miss_error_is_retried() {
            let driver = MockDriver::new();
            let _ = driver.set_elements(".row", vec![row("r1")]).fail_next(
                ".row",
                DriverError::NoSuchElement {
                    selector: ".row".into(),
                },
            );
            let (waiter, clock) = waiter(&driver, 3);
            assert!(waiter.until_visible(&Locator::new(".row")).is_ok());
            assert_eq!(clock.sleep_count(), 1);
        }

        #[test]
        fn test_session_loss_aborts() {
            let driver = MockDriver::new();
            let _ = driver.fail_next(".row", DriverError::Session("browser closed".into()));
            let (waiter, clock) = waiter(&driver, 10);
            let err = waiter.until_visible(&Locator::new(".row")).unwrap_err();
            assert!(matches!(err, WaitError::Aborted { attempt: 1, .. }));
            assert_eq!(clock.sleep_count(), 0);
        }

        #[test]
        fn test_description_uses_locator_name() {
            let driver = MockDriver::new();
            let (waiter, _clock) = waiter(&driver, 1);
            let err = waiter
                .until_visible(&Locator::new("#lr-grid").named("LiveReport grid"))
                .unwrap_err();
            assert!(err.to_string().starts_with("LiveReport grid (#lr-grid) visible"));
        }
    }

    mod not_visible_tests {
        use super::*;

        #[test]
        fn test_spinner_goes_away() {
            let driver = MockDriver::new();
            let spinner = ElementHandle::new("s", "div");
            let _ = driver.script(
                ".spinner",
                [vec![spinner.clone()], vec![spinner.hidden()]],
            );
            let (waiter, clock) = waiter(&driver, 5);
            waiter.until_not_visible(&Locator::new(".spinner")).unwrap();
            assert_eq!(clock.sleep_count(), 1);
        }

        #[test]
        fn test_absent_counts_as_not_visible() {
            let driver = MockDriver::new();
            let (waiter, clock) = waiter(&driver, 5);
            waiter.until_not_visible(&Locator::new(".spinner")).unwrap();
            assert_eq!(clock.sleep_count(), 0);
        }

        #[test]
        fn test_still_visible_message() {
            let driver = MockDriver::new();
            let _ = driver.set_elements(".spinner", vec![ElementHandle::new("s", "div")]);
            let (waiter, _clock) = waiter(&driver, 3);
            let err = waiter.until_not_visible(&Locator::new(".spinner")).unwrap_err();
            assert_eq!(
                last_message(&err),
                "A visible element matching selector `.spinner` was found."
            );
        }
    }

    mod count_and_text_tests {
        use super::*;

        #[test]
        fn test_rows_populate() {
            let driver = MockDriver::new();
            let _ = driver.script(
                ".row",
                [vec![row("r1")], vec![row("r1"), row("r2"), row("r3")]],
            );
            let (waiter, _clock) = waiter(&driver, 5);
            let rows = waiter.until_count(&Locator::new(".row"), 3).unwrap();
            assert_eq!(rows.len(), 3);
        }

        #[test]
        fn test_count_timeout_reports_last_count() {
            let driver = MockDriver::new();
            let _ = driver.set_elements(".row", vec![row("r1")]);
            let (waiter, _clock) = waiter(&driver, 2);
            let err = waiter.until_count(&Locator::new(".row"), 3).unwrap_err();
            assert_eq!(
                last_message(&err),
                "expected 3 element(s) matching `.row`, got 1"
            );
        }

        #[test]
        fn test_zero_count_on_empty_page() {
            let driver = MockDriver::new();
            let (waiter, _clock) = waiter(&driver, 1);
            assert!(waiter.until_count(&Locator::new(".row"), 0).unwrap().is_empty());
        }

        #[test]
        fn test_text_converges() {
            let driver = MockDriver::new();
            let cell = |t: &str| vec![ElementHandle::new("c1", "td").with_text(t)];
            let _ = driver.script("td.status", [cell("Pending"), cell("Done")]);
            let (waiter, _clock) = waiter(&driver, 3);
            let el = waiter.until_text(&Locator::new("td.status"), "Done").unwrap();
            assert_eq!(el.text(), "Done");
        }

        #[test]
        fn test_text_mismatch_message() {
            let driver = MockDriver::new();
            let _ = driver.set_elements(
                "td.status",
                vec![ElementHandle::new("c1", "td").with_text("Pending")],
            );
            let (waiter, _clock) = waiter(&driver, 2);
            let err = waiter.until_text(&Locator::new("td.status"), "Done").unwrap_err();
            assert_eq!(last_message(&err), "expected \"Done\", got \"Pending\"");
        }
    }

    mod title_tests {
        use super::*;

        #[test]
        fn test_matchers() {
            assert!(TitleMatch::exact("Project Alpha").matches("Project Alpha"));
            assert!(!TitleMatch::exact("Project").matches("Project Alpha"));
            assert!(TitleMatch::contains("Alpha").matches("Project Alpha"));
            assert!(TitleMatch::regex(r"^LiveReport \d+$").unwrap().matches("LiveReport 12"));
            assert!(TitleMatch::regex("(").is_err());
        }

        #[test]
        fn test_title_converges() {
            let driver = MockDriver::new();
            let _ = driver.script_titles(["Loading...", "Loading...", "Project Alpha"]);
            let (waiter, clock) = waiter(&driver, 5);
            let title = waiter.until_title(&TitleMatch::contains("Alpha")).unwrap();
            assert_eq!(title, "Project Alpha");
            assert_eq!(clock.sleep_count(), 2);
        }

        #[test]
        fn test_title_timeout_message() {
            let driver = MockDriver::new();
            let _ = driver.script_titles(["Loading..."]);
            let (waiter, _clock) = waiter(&driver, 2);
            let err = waiter.until_title(&TitleMatch::exact("Done")).unwrap_err();
            assert_eq!(
                last_message(&err),
                "expected title == \"Done\", got \"Loading...\""
            );
        }
    }

    mod equal_tests {
        use super::*;

        #[test]
        fn test_until_equal_reads_driver() {
            let driver = MockDriver::new();
            let _ = driver.script(".row", [vec![], vec![row("r1"), row("r2")]]);
            let (waiter, _clock) = waiter(&driver, 3);
            let n = waiter
                .until_equal(|d| Ok(d.find_elements(&Selector::css(".row"))?.len()), &2)
                .unwrap();
            assert_eq!(n, 2);
        }

        #[test]
        fn test_free_wait_until_equal() {
            let calls = Cell::new(0);
            let value = wait_until_equal(
                || {
                    calls.set(calls.get() + 1);
                    Ok(calls.get() * 2)
                },
                6,
                PollPolicy::attempts(5, Duration::from_millis(1)),
            )
            .unwrap();
            assert_eq!(value, 6);
            assert_eq!(calls.get(), 3);
        }

        #[test]
        fn test_free_wait_until_equal_reports_last_actual() {
            let err = wait_until_equal(
                || Ok("Pending"),
                "Done",
                PollPolicy::attempts(2, Duration::from_millis(1)),
            )
            .unwrap_err();
            assert!(err.to_string().contains("expected \"Done\", got \"Pending\""));
        }

        #[test]
        fn test_free_functions_on_system_clock() {
            let driver = MockDriver::new();
            let _ = driver.set_elements("#save", vec![ElementHandle::new("b", "button")]);
            let policy = PollPolicy::attempts(2, Duration::from_millis(1));
            assert!(wait_until_visible(&driver, &Locator::new("#save"), policy).is_ok());
            assert!(wait_until_not_visible(&driver, &Locator::new(".spinner"), policy).is_ok());
            assert_eq!(wait_until_count(&driver, &Locator::new("#save"), 1, policy).unwrap().len(), 1);
        }
    }
}
