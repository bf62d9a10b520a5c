//! storefront-e2e: page-object end-to-end suite for the DemoBlaze storefront
//!
//! Scenarios drive a browser page through typed page objects (login, home,
//! product, cart, checkout). Every page-object operation runs as a named
//! step, waits by polling instead of sleeping, and records expectation
//! failures as soft assertions that are reported together at the end.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                    storefront-e2e Architecture                    │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌─────────────────────┐    │
//! │   │ Scenario   │    │ Page       │    │ BrowserDriver       │    │
//! │   │ (Session)  │───►│ Objects    │───►│ Chromium │ Mock     │    │
//! │   └────────────┘    └────────────┘    └─────────────────────┘    │
//! │         │                 │                                      │
//! │         ▼                 ▼                                      │
//! │   Soft assertions    Step tracer ──► tracing                     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

mod config;
mod data;
mod dialog;
mod driver;
mod error;
mod locator;
mod logging;
mod screenshot;
mod session;
mod soft;
mod step;
mod url;

/// Chrome over CDP (feature `browser`)
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::significant_drop_tightening)]
mod chromium;

/// Selector catalog, one locator set per page
pub mod locators;

/// In-memory storefront implementing the driver seam
#[allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
pub mod mock;

/// Page objects
#[allow(clippy::missing_errors_doc)]
pub mod pages;

/// Price and order-text extraction
pub mod parse;

/// Polling waits
#[allow(clippy::missing_errors_doc)]
pub mod wait;

#[cfg(feature = "browser")]
pub use chromium::ChromiumDriver;
pub use config::{
    BrowserOptions, SettleDelays, SuiteConfig, Timeouts, DEFAULT_BASE_URL, DEFAULT_SCREENSHOT_DIR,
    DEFAULT_TEST_ENV,
};
pub use data::{Category, CheckoutFormData, Product, TestDataLoader, User};
pub use dialog::{Dialog, DialogAction, DialogSubscription, DialogType};
pub use driver::{
    same_page, BrowserDriver, ClickOptions, ElementProbe, LoadState, MouseEvent,
    NavigationResponse, PageHandle,
};
pub use error::{E2eError, E2eResult, ScenarioReport};
pub use locator::{BoundingBox, Locator, Point, Selector};
pub use logging::{init_test_tracing, init_tracing, LogFormat};
pub use pages::{
    BasePage, CartItem, CartPage, CheckoutPage, HomePage, LoginPage, NavigateOptions, PageObject,
    ProductPage,
};
pub use parse::OrderConfirmation;
pub use screenshot::{capture as capture_screenshot, screenshot_file_name};
pub use session::Session;
pub use soft::{AssertionFailure, AssertionSummary, SoftAssertionError, SoftAssertions, SoftHandle};
pub use step::{StepRecord, StepStatus, Tracer};
pub use url::UrlPattern;
pub use wait::{WaitOptions, WaitResult, WaitState};

#[cfg(test)]
mod tests {
    use super::*;

    mod reexport_tests {
        use super::*;

        #[test]
        fn test_default_config_points_at_demoblaze() {
            let config = SuiteConfig::default();
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
            assert_eq!(config.test_env, DEFAULT_TEST_ENV);
        }

        #[test]
        fn test_error_display() {
            let err = E2eError::Timeout {
                waiting_for: "cart table".to_string(),
                ms: 5000,
            };
            assert!(err.to_string().contains("5000"));
            assert!(err.is_timeout());
        }
    }
}
