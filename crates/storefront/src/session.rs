//! One scenario's context: page handle, page objects, soft assertions and
//! the step log.
//!
//! ```ignore
//! let session = Session::new(driver, SuiteConfig::from_env()?)?;
//! let outcome = async {
//!     session.navigate_home().await?;
//!     session.login().login(&user.username, &user.password).await?;
//!     session.login().verify_login_success(&user.username).await
//! }
//! .await;
//! session.conclude("login", outcome).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::config::SuiteConfig;
use crate::data::TestDataLoader;
use crate::driver::PageHandle;
use crate::error::{E2eError, E2eResult, ScenarioReport};
use crate::pages::{
    BasePage, CartPage, CheckoutPage, HomePage, LoginPage, NavigateOptions, PageObject, ProductPage,
};
use crate::screenshot;
use crate::soft::SoftHandle;
use crate::step::{StepRecord, Tracer};

/// Fixture owning everything one scenario needs
#[derive(Debug)]
pub struct Session {
    base: BasePage,
    login: LoginPage,
    home: HomePage,
    product: ProductPage,
    cart: CartPage,
    checkout: CheckoutPage,
    data: TestDataLoader,
}

impl Session {
    /// Validate the configuration and build the page objects over `page`
    pub fn new(page: PageHandle, config: SuiteConfig) -> E2eResult<Self> {
        config.validate()?;
        let data = TestDataLoader::from_config(&config);
        let soft = SoftHandle::new();
        let tracer = Tracer::new().with_soft(soft.clone());
        let base = BasePage::new(page, Arc::new(config), soft, tracer);
        Ok(Self {
            login: LoginPage::new(base.clone()),
            home: HomePage::new(base.clone()),
            product: ProductPage::new(base.clone()),
            cart: CartPage::new(base.clone()),
            checkout: CheckoutPage::new(base.clone()),
            base,
            data,
        })
    }

    /// Move every page object to another page handle.
    ///
    /// Use after the scenario switches to a popup or new tab. Passing the
    /// current handle changes nothing; returns whether anything was rebound.
    pub fn set_page(&mut self, page: PageHandle) -> bool {
        if !self.base.set_page(Arc::clone(&page)) {
            return false;
        }
        self.login.set_page(Arc::clone(&page));
        self.home.set_page(Arc::clone(&page));
        self.product.set_page(Arc::clone(&page));
        self.cart.set_page(Arc::clone(&page));
        self.checkout.set_page(page);
        tracing::info!("session moved to a new page");
        true
    }

    /// Shared primitives
    #[must_use]
    pub fn base(&self) -> &BasePage {
        &self.base
    }

    /// Login page object
    #[must_use]
    pub fn login(&self) -> &LoginPage {
        &self.login
    }

    /// Home page object
    #[must_use]
    pub fn home(&self) -> &HomePage {
        &self.home
    }

    /// Product page object
    #[must_use]
    pub fn product(&self) -> &ProductPage {
        &self.product
    }

    /// Cart page object
    #[must_use]
    pub fn cart(&self) -> &CartPage {
        &self.cart
    }

    /// Checkout page object
    #[must_use]
    pub fn checkout(&self) -> &CheckoutPage {
        &self.checkout
    }

    /// Fixtures for the configured environment
    #[must_use]
    pub fn data(&self) -> &TestDataLoader {
        &self.data
    }

    /// Suite configuration
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        self.base.config()
    }

    /// Soft assertion collector shared by every page object
    #[must_use]
    pub fn soft(&self) -> &SoftHandle {
        self.base.soft()
    }

    /// Steps recorded so far
    #[must_use]
    pub fn steps(&self) -> Vec<StepRecord> {
        self.base.tracer().steps()
    }

    /// Run a scenario-level step
    pub async fn step<T, Fut>(&self, title: &str, operation: Fut) -> E2eResult<T>
    where
        Fut: Future<Output = E2eResult<T>>,
    {
        self.base.tracer().step(title, operation).await
    }

    /// Open the storefront root
    pub async fn navigate_home(&self) -> E2eResult<()> {
        let url = self.config().base_url.clone();
        self.base
            .navigate(&url, &NavigateOptions::default())
            .await?;
        Ok(())
    }

    /// Turn the scenario outcome into the final result.
    ///
    /// A hard failure gets a screenshot. Soft failures and the hard failure
    /// are reported together as `ScenarioFailed`.
    pub async fn conclude<T>(&self, scenario: &str, outcome: E2eResult<T>) -> E2eResult<T> {
        let hard = outcome.as_ref().err().map(ToString::to_string);
        let screenshot = match hard {
            Some(ref message) => {
                tracing::error!(scenario, error = %message, "scenario aborted");
                self.failure_screenshot(scenario).await
            }
            None => None,
        };
        let soft = self.soft().verify().err();

        let steps = self.steps();
        tracing::info!(
            scenario,
            steps = steps.len(),
            failed_steps = steps.iter().filter(|s| s.error.is_some()).count(),
            soft_failures = soft.as_ref().map_or(0, |s| s.count),
            "scenario finished"
        );

        match (outcome, soft) {
            (Ok(value), None) => Ok(value),
            (_, soft) => Err(E2eError::ScenarioFailed(Box::new(ScenarioReport {
                scenario: scenario.to_string(),
                soft,
                hard,
                screenshot,
            }))),
        }
    }

    async fn failure_screenshot(&self, scenario: &str) -> Option<std::path::PathBuf> {
        let name = format!("{scenario}-failure");
        match screenshot::capture(self.base.driver(), &self.config().screenshot_dir, &name, true).await {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(scenario, error = %err, "failure screenshot not captured");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettleDelays;
    use crate::mock::MockStorefront;

    fn session_in(dir: &std::path::Path) -> (Arc<MockStorefront>, Session) {
        let site = Arc::new(MockStorefront::new());
        let config = SuiteConfig::default()
            .with_settle(SettleDelays::none())
            .with_screenshot_dir(dir);
        let session = Session::new(Arc::clone(&site) as PageHandle, config).unwrap();
        (site, session)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let site: PageHandle = Arc::new(MockStorefront::new());
        let config = SuiteConfig::default().with_base_url("not a url");
        assert!(Session::new(site, config).unwrap_err().is_configuration());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_scenario_passes_value_through() {
        let dir = tempfile::tempdir().unwrap();
        let (_site, session) = session_in(dir.path());
        let outcome = session
            .step("Open home", async {
                session.navigate_home().await?;
                Ok(7)
            })
            .await;
        assert_eq!(session.conclude("clean", outcome).await.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_soft_failures_fail_at_conclusion() {
        let dir = tempfile::tempdir().unwrap();
        let (_site, session) = session_in(dir.path());
        session.navigate_home().await.unwrap();
        session.home().verify_logout_button_visible().await.unwrap();

        let err = session.conclude("soft", Ok(())).await.unwrap_err();
        let E2eError::ScenarioFailed(report) = err else {
            panic!("expected ScenarioFailed");
        };
        assert!(report.hard.is_none());
        assert_eq!(report.soft.as_ref().map(|s| s.count), Some(1));
        assert!(report.screenshot.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_failure_captures_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let (_site, session) = session_in(dir.path());
        session.navigate_home().await.unwrap();
        let outcome = session.cart().click_place_order().await;
        let err = session.conclude("hard", outcome).await.unwrap_err();
        let E2eError::ScenarioFailed(report) = err else {
            panic!("expected ScenarioFailed");
        };
        assert!(report.hard.as_deref().is_some_and(|h| h.contains("Timed out")));
        assert!(report.soft.is_none());
        let shot = report.screenshot.unwrap();
        assert!(shot.starts_with(dir.path()));
        assert!(shot.file_name().unwrap().to_string_lossy().starts_with("hard-failure-"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_actions_follow_replacement_page() {
        let dir = tempfile::tempdir().unwrap();
        let (first, mut session) = session_in(dir.path());
        session.navigate_home().await.unwrap();

        let second = Arc::new(MockStorefront::new());
        second.seed_cart(&["Nexus 6"]).unwrap();
        assert!(session.set_page(Arc::clone(&second) as PageHandle));
        assert!(!session.set_page(Arc::clone(&second) as PageHandle));

        let before = first.history().len();
        session.navigate_home().await.unwrap();
        session.home().go_to_cart().await.unwrap();
        assert_eq!(session.cart().verify_cart_item_count(1).await.unwrap(), 1);

        assert_eq!(first.history().len(), before);
        assert!(second.was_called("navigate:"));
        assert!(crate::driver::same_page(
            session.cart().page(),
            &(Arc::clone(&second) as PageHandle)
        ));
        assert_eq!(session.soft().failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_objects_share_one_collector() {
        let dir = tempfile::tempdir().unwrap();
        let (_site, session) = session_in(dir.path());
        session.navigate_home().await.unwrap();
        session.home().verify_login_button_hidden().await.unwrap();
        session.login().verify_logout_success().await.unwrap();
        assert_eq!(session.soft().failure_count(), 1);
        assert!(session.steps().iter().any(|s| s.title == "Verify logout success"));
    }
}
