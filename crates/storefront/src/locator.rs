//! Locator values for element selection.
//!
//! A [`Locator`] is a pure description: a selector expression, an optional
//! match index and a human-readable label. Nothing is resolved when a locator
//! is built; every driver call evaluates it against the live document again.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Layout box of a rendered element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Selector expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// XPath expression
    XPath(String),
    /// CSS selector
    Css(String),
}

impl Selector {
    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Raw expression text
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::XPath(s) | Self::Css(s) => s,
        }
    }

    /// JavaScript expression yielding every match as an array
    #[must_use]
    pub fn to_all_query(&self) -> String {
        match self {
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({s:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); return out; }})()"
            ),
            Self::Css(s) => format!("Array.from(document.querySelectorAll({s:?}))"),
        }
    }

    /// JavaScript expression counting matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        match self {
            Self::XPath(s) => format!(
                "document.evaluate({s:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength"
            ),
            Self::Css(s) => format!("document.querySelectorAll({s:?}).length"),
        }
    }
}

/// Reference to an element (or set of elements) on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    selector: Selector,
    index: Option<usize>,
    description: String,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub fn new(selector: Selector, description: impl Into<String>) -> Self {
        Self {
            selector,
            index: None,
            description: description.into(),
        }
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(expr: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Selector::xpath(expr), description)
    }

    /// Create a CSS locator
    #[must_use]
    pub fn css(selector: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Selector::css(selector), description)
    }

    /// Narrow to the nth match (zero-based)
    #[must_use]
    pub fn nth(&self, index: usize) -> Self {
        Self {
            selector: self.selector.clone(),
            index: Some(index),
            description: format!("{} #{index}", self.description),
        }
    }

    /// Narrow to the first match
    #[must_use]
    pub fn first(&self) -> Self {
        self.nth(0)
    }

    /// Locator for a descendant, scoped to this locator's element.
    ///
    /// `relative` is an XPath step for XPath parents (`td[2]`) and a CSS
    /// descendant selector for CSS parents.
    #[must_use]
    pub fn child(&self, relative: &str, description: impl Into<String>) -> Self {
        let selector = match (&self.selector, self.index) {
            (Selector::XPath(xp), Some(i)) => Selector::XPath(format!("({xp})[{}]/{relative}", i + 1)),
            (Selector::XPath(xp), None) => Selector::XPath(format!("{xp}/{relative}")),
            (Selector::Css(css), Some(i)) => {
                Selector::Css(format!("{css}:nth-of-type({}) {relative}", i + 1))
            }
            (Selector::Css(css), None) => Selector::Css(format!("{css} {relative}")),
        };
        Self::new(selector, description)
    }

    /// Selector expression
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Match index, if narrowed
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// JavaScript expression yielding the targeted element or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        let all = self.selector.to_all_query();
        format!("({all})[{}] ?? null", self.index.unwrap_or(0))
    }

    /// JavaScript expression counting the elements this locator can reach
    #[must_use]
    pub fn to_count_query(&self) -> String {
        match self.index {
            None => self.selector.to_count_query(),
            Some(i) => format!("(({}) > {i} ? 1 : 0)", self.selector.to_count_query()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.description, self.selector.expression())?;
        if let Some(i) = self.index {
            write!(f, "[{i}]")?;
        }
        Ok(())
    }
}
