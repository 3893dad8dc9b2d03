//! Page driver capability.
//!
//! The waits in this crate observe a page only through [`PageDriver`], so any
//! browser automation backend can sit behind them. Drivers report lookup
//! misses as [`DriverError::NoSuchElement`] or as an empty list; both are
//! treated as "not there yet".

use serde::{Deserialize, Serialize};

use crate::locator::Selector;
use crate::result::DriverError;

/// Snapshot of one DOM element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Unique identifier for the element
    pub id: String,
    /// Element tag name
    pub tag_name: String,
    /// Element text content
    pub text_content: Option<String>,
    /// Whether the element is rendered and visible
    pub displayed: bool,
}

impl ElementHandle {
    /// Create a displayed element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            text_content: None,
            displayed: true,
        }
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Mark the element hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Check if element is visible
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.displayed
    }

    /// Text content, or empty when absent
    #[must_use]
    pub fn text(&self) -> &str {
        self.text_content.as_deref().unwrap_or_default()
    }
}

/// Blocking page automation capability
pub trait PageDriver {
    /// All elements currently matching `selector`
    fn find_elements(&self, selector: &Selector) -> Result<Vec<ElementHandle>, DriverError>;

    /// Current document title
    fn title(&self) -> Result<String, DriverError>;

    /// Current URL
    fn current_url(&self) -> Result<String, DriverError>;

    /// Switch into the iframe matched by `selector`
    fn enter_frame(&self, selector: &Selector) -> Result<(), DriverError>;

    /// Switch to the parent of the current frame
    fn parent_frame(&self) -> Result<(), DriverError>;

    /// Switch back to the top-level document
    fn exit_frame(&self) -> Result<(), DriverError>;
}

impl<D: PageDriver + ?Sized> PageDriver for &D {
    fn find_elements(&self, selector: &Selector) -> Result<Vec<ElementHandle>, DriverError> {
        (**self).find_elements(selector)
    }

    fn title(&self) -> Result<String, DriverError> {
        (**self).title()
    }

    fn current_url(&self) -> Result<String, DriverError> {
        (**self).current_url()
    }

    fn enter_frame(&self, selector: &Selector) -> Result<(), DriverError> {
        (**self).enter_frame(selector)
    }

    fn parent_frame(&self) -> Result<(), DriverError> {
        (**self).parent_frame()
    }

    fn exit_frame(&self) -> Result<(), DriverError> {
        (**self).exit_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_defaults_displayed() {
        let el = ElementHandle::new("e1", "div");
        assert!(el.is_visible());
        assert_eq!(el.text(), "");
    }

    #[test]
    fn test_element_builders() {
        let el = ElementHandle::new("e2", "span").with_text("42").hidden();
        assert!(!el.is_visible());
        assert_eq!(el.text(), "42");
        assert_eq!(el.tag_name, "span");
    }
}
