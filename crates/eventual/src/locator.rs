//! Selectors and named locators.
//!
//! Locators are page-object style handles: a selector plus an optional
//! human name. They carry no behaviour of their own; waits resolve them
//! through a [`PageDriver`](crate::driver::PageDriver).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "div.grid-row")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Text content selector
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// CSS selector filtered by text content
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Narrow a CSS selector by text content; other selectors are returned unchanged
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        match self {
            Self::Css(css) => Self::CssWithText {
                css,
                text: text.into(),
            },
            other => other,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) | Self::XPath(s) => write!(f, "{s}"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::TestId(id) => write!(f, "[data-testid=\"{id}\"]"),
            Self::CssWithText { css, text } => write!(f, "{css}:has-text(\"{text}\")"),
        }
    }
}

impl From<&str> for Selector {
    fn from(css: &str) -> Self {
        Self::css(css)
    }
}

/// A named selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    selector: Selector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl Locator {
    /// Create a locator from a CSS selector
    #[must_use]
    pub fn new(css: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(css.into()))
    }

    /// Create a locator from any selector
    #[must_use]
    pub const fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            name: None,
        }
    }

    /// Attach a human-readable name
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Filter by text content
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        Self {
            selector: self.selector.with_text(text),
            name: self.name,
        }
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the name, if any
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl From<Selector> for Locator {
    fn from(selector: Selector) -> Self {
        Self::from_selector(selector)
    }
}

impl From<&str> for Locator {
    fn from(css: &str) -> Self {
        Self::new(css)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({})", self.selector),
            None => write!(f, "{}", self.selector),
        }
    }
}
