//! Home page: category sidebar, product grid and navbar.

use std::ops::Deref;
use std::sync::Arc;

use super::{BasePage, NavigateOptions, PageObject, CART_URL_GLOB, HOME_URL_GLOB};
use crate::data::Category;
use crate::driver::PageHandle;
use crate::error::E2eResult;
use crate::locator::Locator;
use crate::locators::{CartLocators, HomeLocators, LocatorRegistry};
use crate::url::UrlPattern;

/// Home page
#[derive(Debug)]
pub struct HomePage {
    base: BasePage,
    locators: LocatorRegistry<HomeLocators>,
    cart_table: Locator,
}

impl HomePage {
    /// Page object over the base page's handle
    #[must_use]
    pub fn new(base: BasePage) -> Self {
        let locators = LocatorRegistry::new(Arc::clone(base.page()));
        Self {
            base,
            locators,
            cart_table: CartLocators::new().table,
        }
    }

    /// Locators of this screen
    #[must_use]
    pub fn locators(&self) -> &HomeLocators {
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

    /// Filter the grid by category
    pub async fn select_category(&self, category: Category) -> E2eResult<()> {
        self.tracer()
            .step(
                &format!("Select category: {category}"),
                self.click(self.locators.category(category)),
            )
            .await
    }

    /// Open a product page from the grid
    pub async fn select_product(&self, name: &str) -> E2eResult<()> {
        self.tracer()
            .step(&format!("Select product: {name}"), async {
                let link = self.locators.product_link(name);
                self.click(&link).await
            })
            .await
    }

    /// Names currently shown in the product grid.
    ///
    /// Waits for the first card, so an empty grid is a timeout.
    pub async fn product_names(&self) -> E2eResult<Vec<String>> {
        self.tracer()
            .step("Get product names", async {
                let cards = &self.locators.product_cards;
                self.wait_for_visible(&cards.first()).await?;
                let count = self.count(cards).await?;
                let mut names = Vec::with_capacity(count);
                for i in 0..count {
                    let name = self.inner_text(&cards.nth(i)).await?;
                    if !name.is_empty() {
                        names.push(name);
                    }
                }
                Ok(names)
            })
            .await
    }

    /// Click the navbar Home link
    pub async fn click_home(&self) -> E2eResult<()> {
        self.tracer()
            .step("Click Home link", self.click(&self.locators.home_link))
            .await
    }

    /// Open the cart and wait until it can be read.
    ///
    /// Waits for the cart URL and the cart table, then the configured cart
    /// settle delay for rows the storefront loads afterwards.
    pub async fn go_to_cart(&self) -> E2eResult<()> {
        self.tracer()
            .step("Go to Cart", async {
                self.click(&self.locators.cart_link).await?;
                self.wait_for_url_match_within(
                    &UrlPattern::glob(CART_URL_GLOB),
                    self.config().timeouts.cart_url_ms,
                )
                .await?;
                self.wait_for_visible(&self.cart_table).await?;
                self.settle(self.config().settle.cart_ms, "cart rows load")
                    .await;
                Ok(())
            })
            .await
    }

    /// Soft check of the navbar greeting
    pub async fn verify_welcome_message(&self, username: &str) -> E2eResult<()> {
        self.tracer()
            .step("Verify welcome message", async {
                self.wait_for_visible(&self.locators.welcome_text).await?;
                let welcome = self.get_text(&self.locators.welcome_text).await?;
                self.soft().assert_contains(
                    &welcome,
                    &format!("Welcome {username}"),
                    "welcome text names the user",
                );
                Ok(())
            })
            .await
    }

    /// Soft check that "Log in" is gone
    pub async fn verify_login_button_hidden(&self) -> E2eResult<()> {
        self.tracer()
            .step("Verify login button hidden", async {
                self.expect_hidden(&self.locators.login_link).await?;
                Ok(())
            })
            .await
    }

    /// Soft check that "Log out" is shown
    pub async fn verify_logout_button_visible(&self) -> E2eResult<()> {
        self.tracer()
            .step("Verify logout button visible", async {
                self.expect_visible(&self.locators.logout_link).await?;
                Ok(())
            })
            .await
    }

    /// Wait for the home page URL; a timeout is a hard failure
    pub async fn verify_at_home(&self) -> E2eResult<()> {
        self.tracer()
            .step(
                "Verify at home page",
                self.wait_for_url_match_within(
                    &UrlPattern::glob(HOME_URL_GLOB),
                    self.config().timeouts.home_url_ms,
                ),
            )
            .await
    }

    /// Soft check that the URL is the storefront root or its index page
    pub async fn verify_at_home_by_url(&self) -> E2eResult<()> {
        self.tracer()
            .step("Verify at home page by URL", async {
                let url = self.page_url().await?;
                let root = self.config().base_url.trim_end_matches('/');
                let at_home = url == root
                    || url == format!("{root}/")
                    || UrlPattern::glob(HOME_URL_GLOB).matches(&url);
                self.soft()
                    .assert_true(at_home, &format!("expected the home page, got {url}"));
                Ok(())
            })
            .await
    }
}

impl Deref for HomePage {
    type Target = BasePage;

    fn deref(&self) -> &BasePage {
        &self.base
    }
}

impl PageObject for HomePage {
    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::glob(HOME_URL_GLOB)
    }

    fn page_name(&self) -> &'static str {
        "home"
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

    fn home_page() -> (Arc<MockStorefront>, HomePage) {
        let site = Arc::new(MockStorefront::new());
        let page = HomePage::new(base_over(&site));
        (site, page)
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_filters_grid() {
        let (_site, page) = home_page();
        page.navigate_to_home_page().await.unwrap();
        assert_eq!(page.product_names().await.unwrap().len(), 15);
        page.select_category(Category::Monitors).await.unwrap();
        assert_eq!(
            page.product_names().await.unwrap(),
            vec!["Apple monitor 24".to_string(), "ASUS Full HD".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_product_opens_product_page() {
        let (site, page) = home_page();
        page.navigate_to_home_page().await.unwrap();
        page.select_product("Nexus 6").await.unwrap();
        assert!(page.page_url().await.unwrap().ends_with("prod.html?idp_=3"));
        assert!(site.was_called("click:product link 'Nexus 6'"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_go_to_cart_then_home() {
        let (_site, page) = home_page();
        page.navigate_to_home_page().await.unwrap();
        page.go_to_cart().await.unwrap();
        page.verify_url(&UrlPattern::glob(CART_URL_GLOB)).await.unwrap();
        page.click_home().await.unwrap();
        page.verify_at_home().await.unwrap();
        page.verify_at_home_by_url().await.unwrap();
        assert_eq!(page.soft().failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_root_url_counts_as_home() {
        let (_site, page) = home_page();
        page.navigate_to_home_page().await.unwrap();
        page.verify_at_home_by_url().await.unwrap();
        assert_eq!(page.soft().failure_count(), 0);
        assert!(page.verify_at_home().await.unwrap_err().is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_navbar_checks_when_logged_out_are_soft() {
        let (_site, page) = home_page();
        page.navigate_to_home_page().await.unwrap();
        page.verify_login_button_hidden().await.unwrap();
        page.verify_logout_button_visible().await.unwrap();
        assert_eq!(page.soft().failure_count(), 2);
    }
}
