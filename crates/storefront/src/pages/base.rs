//! Shared action primitives.
//!
//! Every page object holds a [`BasePage`] and reaches these through deref.
//! Each primitive runs as a traced step, waits before it acts, and records
//! soft expectations into the session's collector.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SuiteConfig;
use crate::driver::{
    pause, same_page, BrowserDriver, ClickOptions, LoadState, MouseEvent, NavigationResponse, PageHandle,
};
use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, Point};
use crate::locators::by_text;
use crate::screenshot;
use crate::soft::SoftHandle;
use crate::step::Tracer;
use crate::url::UrlPattern;
use crate::wait::{self, WaitOptions, WaitState, ENABLE_ATTEMPTS, ENABLE_INTERVAL_MS};

/// Pointer moves between press and release in [`BasePage::drag_and_drop`]
const DRAG_STEPS: u32 = 10;

/// Default attempts for [`BasePage::retry_click`]
pub const DEFAULT_CLICK_RETRIES: u32 = 3;

/// Options for [`BasePage::navigate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Load state to wait for
    pub load_state: LoadState,
    /// Element that must be visible before navigation counts as done
    pub wait_for_selector: Option<Locator>,
    /// Budget, defaults to the configured navigation timeout
    pub timeout_ms: Option<u64>,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            load_state: LoadState::DomContentLoaded,
            wait_for_selector: None,
            timeout_ms: None,
        }
    }
}

impl NavigateOptions {
    /// Wait for another load state
    #[must_use]
    pub const fn with_load_state(mut self, state: LoadState) -> Self {
        self.load_state = state;
        self
    }

    /// Wait for an element after loading
    #[must_use]
    pub fn with_selector(mut self, locator: Locator) -> Self {
        self.wait_for_selector = Some(locator);
        self
    }

    /// Override the budget
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// Page handle plus the scenario context every page object shares
#[derive(Debug, Clone)]
pub struct BasePage {
    page: PageHandle,
    config: Arc<SuiteConfig>,
    soft: SoftHandle,
    tracer: Tracer,
}

impl BasePage {
    /// Bundle a page with its scenario context
    #[must_use]
    pub fn new(page: PageHandle, config: Arc<SuiteConfig>, soft: SoftHandle, tracer: Tracer) -> Self {
        Self {
            page,
            config,
            soft,
            tracer,
        }
    }

    /// Page handle
    #[must_use]
    pub fn page(&self) -> &PageHandle {
        &self.page
    }

    /// Point later actions at another page, such as a popup or new tab.
    ///
    /// Returns whether the handle changed.
    pub fn set_page(&mut self, page: PageHandle) -> bool {
        if same_page(&self.page, &page) {
            return false;
        }
        tracing::debug!("page handle replaced");
        self.page = page;
        true
    }

    /// Driver behind the page handle
    #[must_use]
    pub fn driver(&self) -> &dyn BrowserDriver {
        self.page.as_ref()
    }

    /// Suite configuration
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Soft assertion collector
    #[must_use]
    pub fn soft(&self) -> &SoftHandle {
        &self.soft
    }

    /// Step tracer
    #[must_use]
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    fn wait_options(&self) -> WaitOptions {
        self.config.wait_options()
    }

    fn expect_options(&self) -> WaitOptions {
        self.config.wait_options_for(self.config.timeouts.expect_ms)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Open `url` and wait for the requested load state.
    ///
    /// A non-2xx status is logged, not raised.
    pub async fn navigate(&self, url: &str, options: &NavigateOptions) -> E2eResult<NavigationResponse> {
        self.tracer
            .step(&format!("Navigate to URL: {url}"), async {
                let timeout_ms = options.timeout_ms.unwrap_or(self.config.timeouts.navigation_ms);
                tracing::info!(url, load_state = %options.load_state, "navigating");
                let response = self
                    .page
                    .navigate(url, options.load_state, Duration::from_millis(timeout_ms))
                    .await
                    .map_err(|err| match err {
                        E2eError::Driver { message } => E2eError::Navigation {
                            url: url.to_string(),
                            message,
                        },
                        other => other,
                    })?;
                if !response.is_ok() {
                    tracing::warn!(url, status = ?response.status, "navigation returned non-OK status");
                }
                if let Some(ref selector) = options.wait_for_selector {
                    tracing::info!(%selector, "waiting for selector");
                    wait::wait_for_state(
                        self.driver(),
                        selector,
                        WaitState::Visible,
                        &self.config.wait_options_for(timeout_ms),
                    )
                    .await?;
                }
                tracing::info!(url, "navigation complete");
                Ok(response)
            })
            .await
    }

    /// Wait until the URL matches, default budget
    pub async fn wait_for_url_match(&self, pattern: &UrlPattern) -> E2eResult<()> {
        self.wait_for_url_match_within(pattern, self.config.timeouts.default_ms)
            .await
    }

    /// Wait until the URL matches within `timeout_ms`
    pub async fn wait_for_url_match_within(&self, pattern: &UrlPattern, timeout_ms: u64) -> E2eResult<()> {
        self.tracer
            .step(&format!("Wait current url match with: {pattern}"), async {
                wait::wait_for_url(self.driver(), pattern, &self.config.wait_options_for(timeout_ms)).await?;
                Ok(())
            })
            .await
    }

    /// Current page URL
    pub async fn page_url(&self) -> E2eResult<String> {
        self.page.current_url().await
    }

    /// Reload the current page
    pub async fn reload(&self) -> E2eResult<()> {
        self.tracer
            .step("Reload current page", self.page.reload(LoadState::Load))
            .await
    }

    /// Hard check that the URL matches, polled like other expectations
    pub async fn verify_url(&self, pattern: &UrlPattern) -> E2eResult<()> {
        self.tracer
            .step("Verify the current URL matches the expected URL", async {
                match wait::wait_for_url(self.driver(), pattern, &self.expect_options()).await {
                    Ok(_) => Ok(()),
                    Err(err) if err.is_timeout() => {
                        let actual = self.page.current_url().await?;
                        Err(E2eError::Assertion {
                            message: format!("expected {pattern}, got {actual}"),
                        })
                    }
                    Err(err) => Err(err),
                }
            })
            .await
    }

    // ------------------------------------------------------------------
    // Waits
    // ------------------------------------------------------------------

    async fn wait_for(&self, locator: &Locator, state: WaitState) -> E2eResult<()> {
        self.tracer
            .step(&format!("Wait Locator with {state} state: Locator={locator}"), async {
                wait::wait_for_state(self.driver(), locator, state, &self.wait_options()).await?;
                Ok(())
            })
            .await
    }

    /// Wait until visible
    pub async fn wait_for_visible(&self, locator: &Locator) -> E2eResult<()> {
        self.wait_for(locator, WaitState::Visible).await
    }

    /// Wait until hidden or gone
    pub async fn wait_for_hidden(&self, locator: &Locator) -> E2eResult<()> {
        self.wait_for(locator, WaitState::Hidden).await
    }

    /// Wait until in the DOM
    pub async fn wait_for_attached(&self, locator: &Locator) -> E2eResult<()> {
        self.wait_for(locator, WaitState::Attached).await
    }

    /// Wait until out of the DOM
    pub async fn wait_for_detached(&self, locator: &Locator) -> E2eResult<()> {
        self.wait_for(locator, WaitState::Detached).await
    }

    /// Poll enablement, failing with `NotEnabled` rather than `Timeout`
    pub async fn wait_for_element_to_be_enabled(&self, locator: &Locator) -> E2eResult<()> {
        self.tracer
            .step(
                &format!("Wait for Locator to be enabled: Locator={locator}"),
                wait::wait_for_enabled(
                    self.driver(),
                    locator,
                    ENABLE_ATTEMPTS,
                    Duration::from_millis(ENABLE_INTERVAL_MS),
                ),
            )
            .await
    }

    /// Wait until the element's trimmed text equals `text`
    pub async fn wait_for_text(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        self.tracer
            .step(
                &format!("Wait for text to appear in locator: Locator={locator}, Text={text}"),
                async {
                    wait::wait_for_text(self.driver(), locator, text, &self.wait_options()).await?;
                    Ok(())
                },
            )
            .await
    }

    // ------------------------------------------------------------------
    // Soft expectations
    // ------------------------------------------------------------------

    async fn expect_state(&self, locator: &Locator, state: WaitState) -> E2eResult<bool> {
        match wait::wait_for_state(self.driver(), locator, state, &self.expect_options()).await {
            Ok(_) => {
                self.soft.assert_true(true, "");
                Ok(true)
            }
            Err(err) if err.is_timeout() => {
                self.soft.assert_true(false, &format!("expected {locator} to be {state}"));
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Soft expectation that the element becomes visible
    pub async fn expect_visible(&self, locator: &Locator) -> E2eResult<bool> {
        self.expect_state(locator, WaitState::Visible).await
    }

    /// Soft expectation that the element becomes hidden
    pub async fn expect_hidden(&self, locator: &Locator) -> E2eResult<bool> {
        self.tracer
            .step("Expect Locator to be hidden", self.expect_state(locator, WaitState::Hidden))
            .await
    }

    async fn expect_enabled(&self, locator: &Locator) -> E2eResult<bool> {
        let enabled = wait::wait_until(&format!("{locator} to be enabled"), &self.expect_options(), || async {
            Ok(self.page.probe(locator).await?.enabled)
        })
        .await;
        match enabled {
            Ok(_) => Ok(true),
            Err(err) if err.is_timeout() => {
                self.soft.assert_true(false, &format!("expected {locator} to be enabled"));
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    async fn click_with(&self, locator: &Locator, options: ClickOptions) -> E2eResult<()> {
        self.wait_for_visible(locator).await?;
        self.expect_visible(locator).await?;
        self.expect_enabled(locator).await?;
        let probe = self.page.probe(locator).await?;
        if !probe.enabled {
            tracing::warn!(%locator, "element disabled, click skipped");
            return Ok(());
        }
        if self.get_attribute(locator, "disabled").await? == "disabled" {
            tracing::warn!(%locator, "element carries disabled=\"disabled\", click skipped");
            return Ok(());
        }
        self.page.click(locator, options).await
    }

    /// Click once the element is visible and enabled.
    ///
    /// A disabled element is recorded as a soft failure and not clicked.
    pub async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.tracer
            .step(
                &format!("Click on locator: {locator}"),
                self.click_with(locator, ClickOptions::default()),
            )
            .await
    }

    /// Double click, same checks as [`Self::click`]
    pub async fn dblclick(&self, locator: &Locator) -> E2eResult<()> {
        self.tracer
            .step(
                &format!("Double Click on Locator: {locator}"),
                self.click_with(locator, ClickOptions::double()),
            )
            .await
    }

    /// Click up to `retries` times; the last failure is returned
    pub async fn retry_click(&self, locator: &Locator, retries: u32) -> E2eResult<()> {
        let attempts = retries.max(1);
        self.tracer
            .step(
                &format!("Retry clicking on Locator: Locator={locator}, Retries={attempts}"),
                async {
                    let mut attempt = 1;
                    loop {
                        match self.click(locator).await {
                            Ok(()) => return Ok(()),
                            Err(err) if attempt < attempts => {
                                tracing::warn!(
                                    %locator,
                                    error = %err,
                                    "Retry {attempt} failed for clicking on Locator. Retrying..."
                                );
                                attempt += 1;
                            }
                            Err(err) => return Err(err),
                        }
                    }
                },
            )
            .await
    }

    /// Click the first element showing `text`
    pub async fn click_by_text(&self, text: &str) -> E2eResult<()> {
        let target = by_text(text).first();
        self.tracer
            .step(&format!("Click on text: {text}"), self.click(&target))
            .await
    }

    /// Open a menu and click the option showing `option_text`.
    ///
    /// For menus built from ordinary elements; the option is looked up by
    /// its text anywhere on the page once the menu is open.
    pub async fn select_option_by_text(&self, dropdown: &Locator, option_text: &str) -> E2eResult<()> {
        let option = by_text(option_text).first();
        self.tracer
            .step(
                &format!("Select option by text: Dropdown={dropdown}, Option={option_text}"),
                async {
                    self.wait_for_visible(dropdown).await?;
                    self.click(dropdown).await?;
                    self.wait_for_visible(&option).await?;
                    self.click(&option).await
                },
            )
            .await
    }

    /// Hover once visible
    pub async fn hover(&self, locator: &Locator) -> E2eResult<()> {
        self.tracer
            .step(&format!("Hover over Locator: {locator}"), async {
                self.wait_for_visible(locator).await?;
                self.expect_visible(locator).await?;
                self.page.hover(locator).await
            })
            .await
    }

    /// Focus the element and press `key`
    pub async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()> {
        self.tracer
            .step(
                &format!("Focus on locator: {locator} and press key: {key}"),
                async {
                    self.wait_for_visible(locator).await?;
                    self.page.press(locator, key).await
                },
            )
            .await
    }

    /// Check a checkbox or radio button
    pub async fn check(&self, locator: &Locator) -> E2eResult<()> {
        self.tracer
            .step(&format!("Check checkbox/radio button: {locator}"), async {
                self.wait_for_visible(locator).await?;
                self.page.set_checked(locator, true).await
            })
            .await
    }

    /// Uncheck a checkbox
    pub async fn uncheck(&self, locator: &Locator) -> E2eResult<()> {
        self.tracer
            .step(&format!("Uncheck checkbox/radio button: {locator}"), async {
                self.wait_for_visible(locator).await?;
                self.page.set_checked(locator, false).await
            })
            .await
    }

    /// Fill using the configured force setting
    pub async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.fill_with(locator, value, self.config.force_fill).await
    }

    /// Fill an input: clear it, click to focus, then type `value`.
    ///
    /// Skipped with a warning when the input is read-only or disabled.
    pub async fn fill_with(&self, locator: &Locator, value: &str, force: bool) -> E2eResult<()> {
        self.tracer
            .step(
                &format!("Fill input value: Locator={locator}, Value={value}"),
                async {
                    self.wait_for_visible(locator).await?;
                    self.expect_visible(locator).await?;
                    let probe = self.page.probe(locator).await?;
                    if !(probe.editable && probe.enabled) {
                        tracing::warn!(%locator, "input not editable, fill skipped");
                        return Ok(());
                    }
                    self.page.clear(locator).await?;
                    self.page.click(locator, ClickOptions::default()).await?;
                    self.page.fill(locator, value, force).await
                },
            )
            .await
    }

    /// Fill only when `value` is non-empty and the input exists
    pub async fn fill_input_if_visible(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.tracer
            .step(
                &format!("Fill input if visible: Locator={locator}, Value={value}"),
                async {
                    self.wait_for_visible(locator).await?;
                    if !value.is_empty() && self.count(locator).await? > 0 {
                        self.scroll_into_view(locator).await?;
                        self.fill(locator, value).await?;
                    }
                    Ok(())
                },
            )
            .await
    }

    /// Empty an input
    pub async fn clear_input(&self, locator: &Locator) -> E2eResult<()> {
        self.tracer
            .step(&format!("Clear input field: Locator={locator}"), async {
                self.wait_for_visible(locator).await?;
                self.page.fill(locator, "", false).await
            })
            .await
    }

    /// Scroll the element into the viewport
    pub async fn scroll_into_view(&self, locator: &Locator) -> E2eResult<()> {
        self.tracer
            .step(&format!("Scroll an element into view: Locator={locator}"), async {
                self.expect_visible(locator).await?;
                tracing::debug!(%locator, "scrolling element into view");
                self.page.scroll_into_view(locator).await
            })
            .await
    }

    /// Drag `source` onto `target` with raw mouse input.
    ///
    /// Presses at the source center and moves to the target center in
    /// [`DRAG_STEPS`] steps before releasing.
    pub async fn drag_and_drop(&self, source: &Locator, target: &Locator) -> E2eResult<()> {
        self.tracer
            .step(&format!("Drag and drop: {source} to {target}"), async {
                self.wait_for_visible(source).await?;
                self.wait_for_visible(target).await?;
                let from = self.center_of(source).await?;
                let to = self.center_of(target).await?;

                self.page.mouse(MouseEvent::Move(from)).await?;
                self.page.mouse(MouseEvent::Down(from)).await?;
                for step in 1..=DRAG_STEPS {
                    let t = f64::from(step) / f64::from(DRAG_STEPS);
                    let point = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
                    self.page.mouse(MouseEvent::Move(point)).await?;
                }
                self.page.mouse(MouseEvent::Up(to)).await
            })
            .await
    }

    async fn center_of(&self, locator: &Locator) -> E2eResult<Point> {
        self.page
            .bounding_box(locator)
            .await?
            .map(|bbox| bbox.center())
            .ok_or_else(|| E2eError::BoundingBox {
                locator: locator.to_string(),
            })
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Visible right now
    pub async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        Ok(self.page.probe(locator).await?.visible)
    }

    /// Enabled right now
    pub async fn is_enabled(&self, locator: &Locator) -> E2eResult<bool> {
        Ok(self.page.probe(locator).await?.enabled)
    }

    /// Editable right now
    pub async fn is_editable(&self, locator: &Locator) -> E2eResult<bool> {
        Ok(self.page.probe(locator).await?.editable)
    }

    /// Number of matches, 0 when nothing matches
    pub async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let count = self.page.count(locator).await?;
        tracing::debug!(%locator, count, "counted elements matching the locator");
        Ok(count)
    }

    /// Text content once visible, `""` when absent
    pub async fn get_text(&self, locator: &Locator) -> E2eResult<String> {
        self.tracer
            .step(&format!("Get text of locator: Locator={locator}"), async {
                self.wait_for_visible(locator).await?;
                Ok(self.page.text_content(locator).await?.unwrap_or_default())
            })
            .await
    }

    /// Attribute value, `""` when absent
    pub async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<String> {
        Ok(self.page.attribute(locator, name).await?.unwrap_or_default())
    }

    /// Live value of an input once it is attached
    pub async fn get_input_value(&self, locator: &Locator) -> E2eResult<String> {
        self.tracer
            .step(&format!("Get input value: Locator={locator}"), async {
                self.wait_for_attached(locator).await?;
                self.page.input_value(locator).await
            })
            .await
    }

    /// Text content with a soft visibility expectation
    pub async fn text_content(&self, locator: &Locator, trim: bool) -> E2eResult<String> {
        self.expect_visible(locator).await?;
        let content = self.page.text_content(locator).await?.unwrap_or_default();
        let result = if trim { content.trim().to_string() } else { content };
        tracing::debug!(%locator, text = %result, "text content of locator");
        Ok(result)
    }

    /// Rendered text, trimmed
    pub async fn inner_text(&self, locator: &Locator) -> E2eResult<String> {
        Ok(self
            .page
            .inner_text(locator)
            .await?
            .map(|text| text.trim().to_string())
            .unwrap_or_default())
    }

    /// Whether the text content contains `text`
    pub async fn contains_text(&self, locator: &Locator, text: &str) -> E2eResult<bool> {
        Ok(self
            .page
            .text_content(locator)
            .await?
            .is_some_and(|content| content.contains(text)))
    }

    // ------------------------------------------------------------------
    // Utility
    // ------------------------------------------------------------------

    /// Save a screenshot under the configured directory
    pub async fn take_screenshot(&self, name: &str) -> E2eResult<Option<PathBuf>> {
        self.tracer
            .step(
                "Take a screenshot of the current page",
                screenshot::capture(self.driver(), &self.config.screenshot_dir, name, true),
            )
            .await
    }

    /// Fixed pause for page work that exposes no readiness signal
    pub async fn settle(&self, ms: u64, reason: &str) {
        if ms > 0 {
            tracing::debug!(ms, reason, "settling");
        }
        pause(Duration::from_millis(ms)).await;
    }
}
