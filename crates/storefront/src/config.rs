//! Suite configuration.
//!
//! Defaults, then an optional YAML file, then environment variables:
//!
//! | Variable         | Field            |
//! |------------------|------------------|
//! | `E2E_CONFIG`     | YAML file to load |
//! | `BASE_URL`       | `base_url`       |
//! | `TEST_ENV`       | `test_env`       |
//! | `HEADLESS`       | `browser.headless` |
//! | `SCREENSHOT_DIR` | `screenshot_dir` |
//! | `JSON_LOGS`      | `json_logs`      |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::wait::WaitOptions;

/// Default storefront
pub const DEFAULT_BASE_URL: &str = "https://www.demoblaze.com";
/// Default fixture environment
pub const DEFAULT_TEST_ENV: &str = "stg";
/// Default screenshot directory
pub const DEFAULT_SCREENSHOT_DIR: &str = "test-results/screenshots";

/// Wait budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Element waits
    pub default_ms: u64,
    /// Page navigation
    pub navigation_ms: u64,
    /// Native dialog after add-to-cart
    pub dialog_ms: u64,
    /// URL change after opening the cart
    pub cart_url_ms: u64,
    /// URL change back to the home page
    pub home_url_ms: u64,
    /// Soft expectations (`expect_visible`, `expect_hidden`)
    pub expect_ms: u64,
    /// Gap between polls
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_ms: 20_000,
            navigation_ms: 30_000,
            dialog_ms: 20_000,
            cart_url_ms: 10_000,
            home_url_ms: 10_000,
            expect_ms: 5_000,
            poll_interval_ms: 100,
        }
    }
}

/// Fixed pauses the storefront needs after its own async work.
///
/// They run after the condition polls that precede them, so they only cover
/// what the page gives no signal for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleDelays {
    /// After the cart table appears
    pub cart_ms: u64,
    /// After accepting the add-to-cart dialog
    pub after_dialog_ms: u64,
    /// Before closing the purchase confirmation
    pub before_confirmation_close_ms: u64,
    /// Before reading the cart rows
    pub cart_read_ms: u64,
    /// Before counting cart rows
    pub cart_count_ms: u64,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            cart_ms: 3_000,
            after_dialog_ms: 1_000,
            before_confirmation_close_ms: 5_000,
            cart_read_ms: 3_000,
            cart_count_ms: 1_000,
        }
    }
}

impl SettleDelays {
    /// No pauses at all
    #[must_use]
    pub const fn none() -> Self {
        Self {
            cart_ms: 0,
            after_dialog_ms: 0,
            before_confirmation_close_ms: 0,
            cart_read_ms: 0,
            cart_count_ms: 0,
        }
    }

    /// Convert a field to a Duration
    #[must_use]
    pub const fn duration(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }
}

/// Browser launch options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// Run without a window
    pub headless: bool,
    /// Chrome/Chromium executable, auto-detected when absent
    pub chromium_path: Option<PathBuf>,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Run with the Chrome sandbox
    pub sandbox: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            viewport_width: 1280,
            viewport_height: 720,
            sandbox: true,
        }
    }
}

/// Configuration for one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Storefront root URL, no trailing slash
    pub base_url: String,
    /// Fixture environment (`data/<test_env>/`)
    pub test_env: String,
    /// Directory holding the per-environment fixture folders
    pub data_root: PathBuf,
    /// Screenshot output directory
    pub screenshot_dir: PathBuf,
    /// Wait budgets
    pub timeouts: Timeouts,
    /// Fixed settle pauses
    pub settle: SettleDelays,
    /// Browser launch options
    pub browser: BrowserOptions,
    /// Fill inputs without actionability checks
    pub force_fill: bool,
    /// Emit JSON log lines
    pub json_logs: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            test_env: DEFAULT_TEST_ENV.to_string(),
            data_root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"),
            screenshot_dir: PathBuf::from(DEFAULT_SCREENSHOT_DIR),
            timeouts: Timeouts::default(),
            settle: SettleDelays::default(),
            browser: BrowserOptions::default(),
            force_fill: true,
            json_logs: false,
        }
    }
}

impl SuiteConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML; missing fields keep their defaults
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    pub fn load(path: &Path) -> E2eResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Defaults, then `E2E_CONFIG`, then the individual variables
    pub fn from_env() -> E2eResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("E2E_CONFIG") {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> E2eResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BASE_URL") {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(env) = lookup("TEST_ENV") {
            self.test_env = env;
        }
        if let Some(dir) = lookup("SCREENSHOT_DIR") {
            self.screenshot_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("HEADLESS") {
            self.browser.headless = parse_flag("HEADLESS", &flag)?;
        }
        if let Some(flag) = lookup("JSON_LOGS") {
            self.json_logs = parse_flag("JSON_LOGS", &flag)?;
        }
        Ok(())
    }

    /// Check values that would make every scenario fail
    pub fn validate(&self) -> E2eResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(E2eError::Config {
                message: format!("base_url must be an http(s) URL, got '{}'", self.base_url),
            });
        }
        if self.test_env.is_empty() {
            return Err(E2eError::Config {
                message: "test_env must not be empty".to_string(),
            });
        }
        if self.timeouts.default_ms == 0 || self.timeouts.poll_interval_ms == 0 {
            return Err(E2eError::Config {
                message: "timeouts must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the settle delays
    #[must_use]
    pub const fn with_settle(mut self, settle: SettleDelays) -> Self {
        self.settle = settle;
        self
    }

    /// Set the screenshot directory
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    /// Set the default element timeout
    #[must_use]
    pub const fn with_default_timeout(mut self, ms: u64) -> Self {
        self.timeouts.default_ms = ms;
        self
    }

    /// Fixture directory for the selected environment
    #[must_use]
    pub fn fixture_dir(&self) -> PathBuf {
        self.data_root.join(&self.test_env)
    }

    /// Home page URL
    #[must_use]
    pub fn index_url(&self) -> String {
        format!("{}/index.html", self.base_url)
    }

    /// Options for element waits
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.timeouts.default_ms,
            poll_interval_ms: self.timeouts.poll_interval_ms,
        }
    }

    /// Element wait options with another budget
    #[must_use]
    pub const fn wait_options_for(&self, timeout_ms: u64) -> WaitOptions {
        WaitOptions {
            timeout_ms,
            poll_interval_ms: self.timeouts.poll_interval_ms,
        }
    }
}

fn parse_flag(name: &str, value: &str) -> E2eResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(E2eError::Config {
            message: format!("{name} must be a boolean, got '{other}'"),
        }),
    }
}
