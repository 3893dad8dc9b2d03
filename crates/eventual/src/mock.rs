//! Scripted page driver for tests.
//!
//! Each selector owns a queue of snapshots. Every lookup consumes the front
//! snapshot; the last one repeats forever, so a script such as
//! `[[], [], [row]]` models "the row appears on the third lookup and stays".
//! Unscripted selectors match nothing.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::driver::{ElementHandle, PageDriver};
use crate::locator::Selector;
use crate::result::DriverError;

type Snapshot = Result<Vec<ElementHandle>, DriverError>;

#[derive(Debug, Default)]
struct MockState {
    elements: HashMap<Selector, VecDeque<Snapshot>>,
    lookups: HashMap<Selector, usize>,
    titles: VecDeque<String>,
    url: String,
    frames: HashSet<Selector>,
    frame_stack: Vec<Selector>,
    call_history: Vec<String>,
}

fn next_in<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

/// Mock driver for unit testing waits
#[derive(Debug, Default)]
pub struct MockDriver {
    state: RefCell<MockState>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script successive lookup results for `selector`
    pub fn script(
        &self,
        selector: impl Into<Selector>,
        snapshots: impl IntoIterator<Item = Vec<ElementHandle>>,
    ) -> &Self {
        let queue = snapshots.into_iter().map(Ok).collect();
        let _ = self
            .state
            .borrow_mut()
            .elements
            .insert(selector.into(), queue);
        self
    }

    /// Make `selector` match `elements` on every lookup
    pub fn set_elements(&self, selector: impl Into<Selector>, elements: Vec<ElementHandle>) -> &Self {
        self.script(selector, [elements])
    }

    /// Make the next lookup of `selector` fail with `error`
    pub fn fail_next(&self, selector: impl Into<Selector>, error: DriverError) -> &Self {
        let mut state = self.state.borrow_mut();
        let queue = state.elements.entry(selector.into()).or_default();
        if queue.is_empty() {
            queue.push_back(Ok(Vec::new()));
        }
        queue.push_front(Err(error));
        self
    }

    /// Script successive document titles
    pub fn script_titles<S: Into<String>>(&self, titles: impl IntoIterator<Item = S>) -> &Self {
        self.state.borrow_mut().titles = titles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the current URL
    pub fn set_url(&self, url: impl Into<String>) -> &Self {
        self.state.borrow_mut().url = url.into();
        self
    }

    /// Register an iframe that can be entered
    pub fn add_frame(&self, selector: impl Into<Selector>) -> &Self {
        let _ = self.state.borrow_mut().frames.insert(selector.into());
        self
    }

    /// Number of lookups performed for `selector`
    #[must_use]
    pub fn lookup_count(&self, selector: &Selector) -> usize {
        self.state
            .borrow()
            .lookups
            .get(selector)
            .copied()
            .unwrap_or_default()
    }

    /// Current iframe nesting depth
    #[must_use]
    pub fn frame_depth(&self) -> usize {
        self.state.borrow().frame_stack.len()
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state
            .borrow()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }
}

impl PageDriver for MockDriver {
    fn find_elements(&self, selector: &Selector) -> Result<Vec<ElementHandle>, DriverError> {
        let mut state = self.state.borrow_mut();
        state.call_history.push(format!("find_elements:{selector}"));
        *state.lookups.entry(selector.clone()).or_default() += 1;
        state
            .elements
            .get_mut(selector)
            .and_then(next_in)
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn title(&self) -> Result<String, DriverError> {
        let mut state = self.state.borrow_mut();
        state.call_history.push("title".to_string());
        Ok(next_in(&mut state.titles).unwrap_or_default())
    }

    fn current_url(&self) -> Result<String, DriverError> {
        let mut state = self.state.borrow_mut();
        state.call_history.push("current_url".to_string());
        Ok(state.url.clone())
    }

    fn enter_frame(&self, selector: &Selector) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.call_history.push(format!("enter_frame:{selector}"));
        if !state.frames.contains(selector) {
            return Err(DriverError::NoSuchFrame {
                selector: selector.to_string(),
            });
        }
        state.frame_stack.push(selector.clone());
        Ok(())
    }

    fn parent_frame(&self) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.call_history.push("parent_frame".to_string());
        let _ = state.frame_stack.pop();
        Ok(())
    }

    fn exit_frame(&self) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.call_history.push("exit_frame".to_string());
        state.frame_stack.clear();
        Ok(())
    }
}
