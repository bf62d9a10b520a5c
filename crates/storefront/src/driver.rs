//! BrowserDriver - the browser-automation seam.
//!
//! Page objects never talk to a browser directly. They hold a [`PageHandle`]
//! and go through this trait, which has two implementations:
//!
//! - `ChromiumDriver` (feature `browser`): Chrome over CDP via chromiumoxide
//! - [`MockStorefront`](crate::mock::MockStorefront): in-memory storefront for tests

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dialog::{DialogAction, DialogSubscription};
use crate::error::E2eResult;
use crate::locator::{BoundingBox, Locator, Point};

/// Page load states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadState {
    /// The `load` event fired
    #[default]
    Load,
    /// `DOMContentLoaded` fired
    DomContentLoaded,
    /// No network activity for 500ms
    NetworkIdle,
}

impl LoadState {
    /// Get the JavaScript event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::NetworkIdle => "networkidle",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

/// Outcome of a navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationResponse {
    /// Final URL
    pub url: String,
    /// HTTP status of the main document, when known
    pub status: Option<u16>,
}

impl NavigationResponse {
    /// 2xx status (unknown counts as OK)
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.map_or(true, |s| (200..300).contains(&s))
    }
}

/// Snapshot of the first element a locator reaches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ElementProbe {
    /// Present in the DOM
    pub attached: bool,
    /// Rendered with a non-empty box and not hidden by style
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Accepts text input
    pub editable: bool,
}

impl ElementProbe {
    /// Probe for a locator that matched nothing
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            attached: false,
            visible: false,
            enabled: false,
            editable: false,
        }
    }
}

/// Click options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOptions {
    /// 1 for a click, 2 for a double click
    pub click_count: u32,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self { click_count: 1 }
    }
}

impl ClickOptions {
    /// Double click
    #[must_use]
    pub const fn double() -> Self {
        Self { click_count: 2 }
    }
}

/// Low-level mouse input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseEvent {
    /// Move the pointer
    Move(Point),
    /// Press the left button
    Down(Point),
    /// Release the left button
    Up(Point),
}

/// Abstract driver trait for browser automation.
///
/// Every method evaluates its locator against the live document.
#[async_trait]
pub trait BrowserDriver: Send + Sync + std::fmt::Debug {
    /// Navigate to URL and wait for the load state
    async fn navigate(
        &self,
        url: &str,
        wait_until: LoadState,
        timeout: Duration,
    ) -> E2eResult<NavigationResponse>;

    /// Get current URL
    async fn current_url(&self) -> E2eResult<String>;

    /// Reload the page
    async fn reload(&self, wait_until: LoadState) -> E2eResult<()>;

    /// Snapshot element state
    async fn probe(&self, locator: &Locator) -> E2eResult<ElementProbe>;

    /// Count matching elements
    async fn count(&self, locator: &Locator) -> E2eResult<usize>;

    /// Raw `textContent`, `None` when nothing matches
    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>>;

    /// Rendered `innerText`, `None` when nothing matches
    async fn inner_text(&self, locator: &Locator) -> E2eResult<Option<String>>;

    /// Live `value` of an input; an error when the element takes no value
    async fn input_value(&self, locator: &Locator) -> E2eResult<String>;

    /// Attribute value, `None` when absent
    async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>>;

    /// Layout box, `None` when not rendered
    async fn bounding_box(&self, locator: &Locator) -> E2eResult<Option<BoundingBox>>;

    /// Click element
    async fn click(&self, locator: &Locator, options: ClickOptions) -> E2eResult<()>;

    /// Move the pointer over the element
    async fn hover(&self, locator: &Locator) -> E2eResult<()>;

    /// Replace the element's value; `force` skips actionability checks
    async fn fill(&self, locator: &Locator, value: &str, force: bool) -> E2eResult<()>;

    /// Empty an input
    async fn clear(&self, locator: &Locator) -> E2eResult<()>;

    /// Press a key while the element has focus
    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()>;

    /// Set checkbox state
    async fn set_checked(&self, locator: &Locator, checked: bool) -> E2eResult<()>;

    /// Scroll the element into the viewport
    async fn scroll_into_view(&self, locator: &Locator) -> E2eResult<()>;

    /// Dispatch raw mouse input
    async fn mouse(&self, event: MouseEvent) -> E2eResult<()>;

    /// Subscribe to dialogs opened from now on
    async fn subscribe_dialogs(&self) -> E2eResult<DialogSubscription>;

    /// Answer the open dialog
    async fn respond_to_dialog(&self, action: &DialogAction) -> E2eResult<()>;

    /// Capture a PNG screenshot
    async fn screenshot(&self, full_page: bool) -> E2eResult<Vec<u8>>;

    /// Whether the page has been closed
    fn is_closed(&self) -> bool;
}

/// Shared handle to one browser page
pub type PageHandle = Arc<dyn BrowserDriver>;

/// Identity comparison for page handles
#[must_use]
pub fn same_page(a: &PageHandle, b: &PageHandle) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// Pause used by polling loops and settle delays
pub(crate) async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockStorefront;

    #[test]
    fn test_load_state_names() {
        assert_eq!(LoadState::default(), LoadState::Load);
        assert_eq!(LoadState::DomContentLoaded.to_string(), "DOMContentLoaded");
        assert_eq!(LoadState::NetworkIdle.event_name(), "networkidle");
    }

    #[test]
    fn test_navigation_response_status() {
        let ok = NavigationResponse {
            url: "u".into(),
            status: Some(200),
        };
        let missing = NavigationResponse {
            url: "u".into(),
            status: Some(404),
        };
        let unknown = NavigationResponse {
            url: "u".into(),
            status: None,
        };
        assert!(ok.is_ok());
        assert!(!missing.is_ok());
        assert!(unknown.is_ok());
    }

    #[test]
    fn test_same_page_is_pointer_identity() {
        let a: PageHandle = Arc::new(MockStorefront::new());
        let b: PageHandle = Arc::new(MockStorefront::new());
        let a2 = Arc::clone(&a);
        assert!(same_page(&a, &a2));
        assert!(!same_page(&a, &b));
    }

    #[test]
    fn test_click_options() {
        assert_eq!(ClickOptions::default().click_count, 1);
        assert_eq!(ClickOptions::double().click_count, 2);
    }
}
