//! Login modal and session navbar.

use std::ops::Deref;
use std::sync::Arc;

use super::{BasePage, NavigateOptions, PageObject};
use crate::driver::PageHandle;
use crate::error::E2eResult;
use crate::locators::{LocatorRegistry, LoginLocators};
use crate::url::UrlPattern;

/// Login flow
#[derive(Debug)]
pub struct LoginPage {
    base: BasePage,
    locators: LocatorRegistry<LoginLocators>,
}

impl LoginPage {
    /// Page object over the base page's handle
    #[must_use]
    pub fn new(base: BasePage) -> Self {
        let locators = LocatorRegistry::new(Arc::clone(base.page()));
        Self { base, locators }
    }

    /// Locators of this screen
    #[must_use]
    pub fn locators(&self) -> &LoginLocators {
        &self.locators
    }

    /// Open the storefront root
    pub async fn navigate_to_home_page(&self) -> E2eResult<()> {
        self.tracer()
            .step("Navigate to home page", async {
                self.navigate(&self.config().base_url, &NavigateOptions::default())
                    .await?;
                Ok(())
            })
            .await
    }

    /// Click "Log in" and wait for the modal
    pub async fn open_login_modal(&self) -> E2eResult<()> {
        self.tracer()
            .step("Open login modal", async {
                self.click(&self.locators.login_link).await?;
                self.wait_for_visible(&self.locators.modal).await
            })
            .await
    }

    /// Type the username
    pub async fn fill_username(&self, username: &str) -> E2eResult<()> {
        self.tracer()
            .step("Fill username", self.fill(&self.locators.username_input, username))
            .await
    }

    /// Type the password
    pub async fn fill_password(&self, password: &str) -> E2eResult<()> {
        self.tracer()
            .step("Fill password", self.fill(&self.locators.password_input, password))
            .await
    }

    /// Submit and wait for the modal to close.
    ///
    /// A closed modal only means the storefront accepted the form; use
    /// [`Self::verify_login_success`] to check the session.
    pub async fn click_login_button(&self) -> E2eResult<()> {
        self.tracer()
            .step("Click login button in modal", async {
                self.click(&self.locators.submit_button).await?;
                self.wait_for_hidden(&self.locators.modal).await
            })
            .await
    }

    /// Open the modal, fill both fields, submit
    pub async fn login(&self, username: &str, password: &str) -> E2eResult<()> {
        self.tracer()
            .step("Complete login flow", async {
                self.open_login_modal().await?;
                self.fill_username(username).await?;
                self.fill_password(password).await?;
                self.click_login_button().await
            })
            .await
    }

    /// Soft checks on the navbar after logging in
    pub async fn verify_login_success(&self, username: &str) -> E2eResult<()> {
        self.tracer()
            .step("Verify login success", async {
                self.wait_for_visible(&self.locators.welcome_text).await?;
                let welcome = self.get_text(&self.locators.welcome_text).await?;
                self.soft().assert_contains(
                    &welcome,
                    &format!("Welcome {username}"),
                    "welcome text names the user",
                );
                self.expect_visible(&self.locators.logout_link).await?;
                self.expect_hidden(&self.locators.login_link).await?;
                Ok(())
            })
            .await
    }

    /// Log out and wait for "Log in" to come back
    pub async fn logout(&self) -> E2eResult<()> {
        self.tracer()
            .step("Logout", async {
                self.click(&self.locators.logout_link).await?;
                self.wait_for_visible(&self.locators.login_link).await
            })
            .await
    }

    /// Soft checks on the navbar after logging out
    pub async fn verify_logout_success(&self) -> E2eResult<()> {
        self.tracer()
            .step("Verify logout success", async {
                self.expect_visible(&self.locators.login_link).await?;
                self.expect_hidden(&self.locators.logout_link).await?;
                Ok(())
            })
            .await
    }
}

impl Deref for LoginPage {
    type Target = BasePage;

    fn deref(&self) -> &BasePage {
        &self.base
    }
}

impl PageObject for LoginPage {
    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::Any
    }

    fn page_name(&self) -> &'static str {
        "login"
    }

    fn base(&self) -> &BasePage {
        &self.base
    }

    fn set_page(&mut self, page: PageHandle) -> bool {
        self.base.set_page(Arc::clone(&page));
        self.locators.set_page(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockStorefront;
    use crate::pages::test_support::base_over;

    fn login_page() -> (Arc<MockStorefront>, LoginPage) {
        let site = Arc::new(MockStorefront::new());
        let page = LoginPage::new(base_over(&site));
        (site, page)
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_and_verify() {
        let (site, page) = login_page();
        page.navigate_to_home_page().await.unwrap();
        page.login("autouser_20251005_1234", "Auto@12345").await.unwrap();
        page.verify_login_success("autouser_20251005_1234").await.unwrap();
        assert_eq!(site.logged_in_user().as_deref(), Some("autouser_20251005_1234"));
        assert_eq!(page.soft().failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_page_moves_actions_to_new_handle() {
        let (first, mut page) = login_page();
        assert!(!page.set_page(Arc::clone(&first) as PageHandle));

        let popup = Arc::new(MockStorefront::new());
        assert!(page.set_page(Arc::clone(&popup) as PageHandle));
        assert!(!page.set_page(Arc::clone(&popup) as PageHandle));

        page.navigate_to_home_page().await.unwrap();
        page.login("autouser_20251005_1234", "Auto@12345").await.unwrap();
        assert_eq!(popup.logged_in_user().as_deref(), Some("autouser_20251005_1234"));
        assert!(first.history().is_empty());
        assert!(first.logged_in_user().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_password_keeps_modal_open() {
        let (site, page) = login_page();
        page.navigate_to_home_page().await.unwrap();
        let err = page
            .login("autouser_20251005_1234", "wrong")
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(site.was_called("dialog:Wrong password."));
        assert!(site.logged_in_user().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_login_success_names_other_user_softly() {
        let (_site, page) = login_page();
        page.navigate_to_home_page().await.unwrap();
        page.login("autouser_20251005_5678", "Auto@67890").await.unwrap();
        page.verify_login_success("someone_else").await.unwrap();
        let failures = page.soft().failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].step.as_deref(), Some("Verify login success"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_round_trip() {
        let (site, page) = login_page();
        page.navigate_to_home_page().await.unwrap();
        page.login("autouser_20251005_1234", "Auto@12345").await.unwrap();
        page.logout().await.unwrap();
        page.verify_logout_success().await.unwrap();
        assert!(site.logged_in_user().is_none());
        assert_eq!(page.soft().failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_nest_under_composite() {
        let (_site, page) = login_page();
        page.navigate_to_home_page().await.unwrap();
        page.login("autouser_20251005_1234", "Auto@12345").await.unwrap();
        let steps = page.tracer().steps();
        let composite = steps
            .iter()
            .find(|s| s.title == "Complete login flow")
            .unwrap();
        let open = steps.iter().find(|s| s.title == "Open login modal").unwrap();
        assert_eq!(open.parent_id, Some(composite.id));
    }
}
