//! Polling waits.
//!
//! Every wait re-probes the live page until its condition holds or the
//! budget runs out. Budgets are measured on the tokio clock, so tests with a
//! paused runtime run instantly.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::driver::{pause, BrowserDriver, ElementProbe};
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::url::UrlPattern;

/// Default wait budget (20 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Enablement polls before giving up
pub const ENABLE_ATTEMPTS: u32 = 10;

/// Gap between enablement polls (500ms)
pub const ENABLE_INTERVAL_MS: u64 = 500;

/// Element state to wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitState {
    /// Attached and rendered
    Visible,
    /// Detached or not rendered
    Hidden,
    /// Present in the DOM
    Attached,
    /// Absent from the DOM
    Detached,
}

impl WaitState {
    /// Whether a probe satisfies this state
    #[must_use]
    pub const fn satisfied_by(&self, probe: &ElementProbe) -> bool {
        match self {
            Self::Visible => probe.attached && probe.visible,
            Self::Hidden => !probe.attached || !probe.visible,
            Self::Attached => probe.attached,
            Self::Detached => !probe.attached,
        }
    }
}

impl std::fmt::Display for WaitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Visible => write!(f, "visible"),
            Self::Hidden => write!(f, "hidden"),
            Self::Attached => write!(f, "attached"),
            Self::Detached => write!(f, "detached"),
        }
    }
}

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
    /// Number of checks made
    pub polls: u32,
}

/// Poll an async condition until it holds.
///
/// The condition is checked once immediately and then once per poll
/// interval; errors from the condition abort the wait.
pub async fn wait_until<F, Fut>(
    description: &str,
    options: &WaitOptions,
    mut condition: F,
) -> E2eResult<WaitResult>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = E2eResult<bool>> + Send,
{
    let start = Instant::now();
    let timeout = options.timeout();
    let mut polls = 0;

    loop {
        polls += 1;
        if condition().await? {
            return Ok(WaitResult {
                elapsed: start.elapsed(),
                waited_for: description.to_string(),
                polls,
            });
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            tracing::debug!(waiting_for = description, polls, "wait timed out");
            return Err(E2eError::Timeout {
                waiting_for: description.to_string(),
                ms: options.timeout_ms,
            });
        }
        pause(options.poll_interval().min(timeout - elapsed)).await;
    }
}

/// Wait for an element to reach a state
pub async fn wait_for_state(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    state: WaitState,
    options: &WaitOptions,
) -> E2eResult<WaitResult> {
    let description = format!("{locator} to be {state}");
    wait_until(&description, options, || async move {
        let probe = driver.probe(locator).await?;
        Ok(state.satisfied_by(&probe))
    })
    .await
}

/// Wait for the page URL to match a pattern
pub async fn wait_for_url(
    driver: &dyn BrowserDriver,
    pattern: &UrlPattern,
    options: &WaitOptions,
) -> E2eResult<WaitResult> {
    let description = pattern.to_string();
    wait_until(&description, options, || async move {
        let url = driver.current_url().await?;
        Ok(pattern.matches(&url))
    })
    .await
}

/// Wait for an element's text to equal `expected` (trimmed)
pub async fn wait_for_text(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    expected: &str,
    options: &WaitOptions,
) -> E2eResult<WaitResult> {
    let description = format!("{locator} to have text '{expected}'");
    wait_until(&description, options, || async move {
        let text = driver.text_content(locator).await?.unwrap_or_default();
        Ok(text.trim() == expected)
    })
    .await
}

/// Last count seen by [`wait_for_count`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountWait {
    /// Match count at the final poll
    pub count: usize,
    /// Whether the predicate held before the budget ran out
    pub satisfied: bool,
}

/// Poll the match count of a locator until a predicate holds.
///
/// Unlike the other waits, running out of budget is not an error: the
/// caller gets the last observed count and decides.
pub async fn wait_for_count<P>(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    options: &WaitOptions,
    predicate: P,
) -> E2eResult<CountWait>
where
    P: Fn(usize) -> bool + Send,
{
    let start = Instant::now();
    let timeout = options.timeout();
    loop {
        let count = driver.count(locator).await?;
        if predicate(count) {
            return Ok(CountWait {
                count,
                satisfied: true,
            });
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Ok(CountWait {
                count,
                satisfied: false,
            });
        }
        pause(options.poll_interval().min(timeout - elapsed)).await;
    }
}

/// Poll until the element is enabled.
///
/// Makes `attempts` checks `interval` apart and fails with `NotEnabled`,
/// not `Timeout`, when all of them see a disabled element.
pub async fn wait_for_enabled(
    driver: &dyn BrowserDriver,
    locator: &Locator,
    attempts: u32,
    interval: Duration,
) -> E2eResult<()> {
    for attempt in 1..=attempts {
        let probe = driver.probe(locator).await?;
        if probe.enabled {
            return Ok(());
        }
        tracing::debug!(%locator, attempt, "element not enabled yet");
        if attempt < attempts {
            pause(interval).await;
        }
    }
    Err(E2eError::NotEnabled {
        locator: locator.to_string(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locators::{CommonLocators, LoginLocators};
    use crate::mock::MockStorefront;
    use std::sync::atomic::{AtomicU32, Ordering};

    mod wait_until_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_succeeds_once_condition_holds() {
            let calls = AtomicU32::new(0);
            let options = WaitOptions::new().with_timeout(1_000).with_poll_interval(100);
            let result = wait_until("third poll", &options, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n >= 2) }
            })
            .await
            .unwrap();
            assert_eq!(result.polls, 3);
            assert_eq!(result.elapsed, Duration::from_millis(200));
        }

        #[tokio::test(start_paused = true)]
        async fn test_times_out_with_budget_in_error() {
            let options = WaitOptions::new().with_timeout(750);
            let err = wait_until("never", &options, || async { Ok(false) })
                .await
                .unwrap_err();
            match err {
                E2eError::Timeout { waiting_for, ms } => {
                    assert_eq!(waiting_for, "never");
                    assert_eq!(ms, 750);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_condition_error_aborts() {
            let options = WaitOptions::new();
            let err = wait_until("broken", &options, || async {
                Err::<bool, _>(E2eError::driver("target closed"))
            })
            .await
            .unwrap_err();
            assert!(matches!(err, E2eError::Driver { .. }));
        }
    }

    mod element_wait_tests {
        use super::*;

        #[test]
        fn test_state_predicates() {
            let gone = ElementProbe::detached();
            let shown = ElementProbe {
                attached: true,
                visible: true,
                enabled: true,
                editable: false,
            };
            assert!(WaitState::Detached.satisfied_by(&gone));
            assert!(WaitState::Hidden.satisfied_by(&gone));
            assert!(WaitState::Visible.satisfied_by(&shown));
            assert!(WaitState::Attached.satisfied_by(&shown));
            assert!(!WaitState::Hidden.satisfied_by(&shown));
        }

        #[tokio::test(start_paused = true)]
        async fn test_hidden_modal_times_out_waiting_visible() {
            let site = MockStorefront::new();
            site.open_home();
            let login = LoginLocators::new();
            let options = WaitOptions::new().with_timeout(2_000);
            let err = wait_for_state(&site, &login.modal, WaitState::Visible, &options)
                .await
                .unwrap_err();
            assert!(err.is_timeout());
            wait_for_state(&site, &login.modal, WaitState::Hidden, &options)
                .await
                .unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_enabled_after_temporary_disable() {
            let site = MockStorefront::new();
            site.open_home();
            let common = CommonLocators::new();
            site.disable_for(&common.login_link, Duration::from_millis(1_200));
            wait_for_enabled(&site, &common.login_link, ENABLE_ATTEMPTS, Duration::from_millis(ENABLE_INTERVAL_MS))
                .await
                .unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_not_enabled_is_distinct_from_timeout() {
            let site = MockStorefront::new();
            site.open_home();
            let common = CommonLocators::new();
            site.disable_for(&common.login_link, Duration::from_secs(60));
            let err = wait_for_enabled(&site, &common.login_link, ENABLE_ATTEMPTS, Duration::from_millis(ENABLE_INTERVAL_MS))
                .await
                .unwrap_err();
            assert!(matches!(err, E2eError::NotEnabled { attempts: 10, .. }));
            assert!(!err.is_timeout());
        }

        #[tokio::test(start_paused = true)]
        async fn test_url_wait() {
            let site = MockStorefront::new();
            site.open_home();
            let options = WaitOptions::new().with_timeout(500);
            wait_for_url(&site, &UrlPattern::glob("**/index.html"), &options)
                .await
                .unwrap();
            assert!(wait_for_url(&site, &UrlPattern::glob("**/cart.html"), &options)
                .await
                .unwrap_err()
                .is_timeout());
        }
    }
}
