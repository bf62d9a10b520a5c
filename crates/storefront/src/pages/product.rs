//! Product detail page.

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use super::{BasePage, PageObject};
use crate::dialog::{Dialog, DialogAction};
use crate::driver::PageHandle;
use crate::error::E2eResult;
use crate::locators::{LocatorRegistry, ProductLocators};
use crate::parse::parse_product_price;
use crate::url::UrlPattern;

/// Product page
#[derive(Debug)]
pub struct ProductPage {
    base: BasePage,
    locators: LocatorRegistry<ProductLocators>,
}

impl ProductPage {
    /// Page object over the base page's handle
    #[must_use]
    pub fn new(base: BasePage) -> Self {
        let locators = LocatorRegistry::new(Arc::clone(base.page()));
        Self { base, locators }
    }

    /// Locators of this screen
    #[must_use]
    pub fn locators(&self) -> &ProductLocators {
        &self.locators
    }

    /// Add the shown product and accept the confirmation alert.
    ///
    /// The dialog subscription is opened before the click. No alert within
    /// the dialog budget is a hard failure.
    pub async fn add_to_cart(&self) -> E2eResult<Dialog> {
        self.tracer()
            .step("Add product to cart", async {
                let mut dialogs = self.page().subscribe_dialogs().await?;
                self.click(&self.locators.add_to_cart_button).await?;

                let dialog = dialogs
                    .next(Duration::from_millis(self.config().timeouts.dialog_ms))
                    .await?;
                tracing::info!(message = dialog.message(), "Alert message");
                self.page().respond_to_dialog(&DialogAction::Accept).await?;

                self.settle(self.config().settle.after_dialog_ms, "cart update after alert")
                    .await;
                Ok(dialog)
            })
            .await
    }

    /// Heading text
    pub async fn get_product_name(&self) -> E2eResult<String> {
        self.tracer()
            .step("Get product name", async {
                self.wait_for_visible(&self.locators.name_heading).await?;
                Ok(self.get_text(&self.locators.name_heading).await?.trim().to_string())
            })
            .await
    }

    /// Price label parsed to a number, 0 when it holds none
    pub async fn get_product_price(&self) -> E2eResult<f64> {
        self.tracer()
            .step("Get product price", async {
                self.wait_for_visible(&self.locators.price_label).await?;
                let text = self.get_text(&self.locators.price_label).await?;
                Ok(parse_product_price(&text))
            })
            .await
    }

    /// Soft checks of name and, when given, price
    pub async fn verify_product_details(&self, name: &str, price: Option<f64>) -> E2eResult<()> {
        self.tracer()
            .step("Verify product details", async {
                let actual_name = self.get_product_name().await?;
                self.soft()
                    .assert_eq(&actual_name.as_str(), &name, "product name");
                if let Some(expected) = price {
                    let actual = self.get_product_price().await?;
                    self.soft().assert_eq(&actual, &expected, "product price");
                }
                Ok(())
            })
            .await
    }

    /// Back to the home page
    pub async fn navigate_home(&self) -> E2eResult<()> {
        self.tracer()
            .step("Navigate to home", self.click(&self.locators.back_home_link))
            .await
    }
}

impl Deref for ProductPage {
    type Target = BasePage;

    fn deref(&self) -> &BasePage {
        &self.base
    }
}

impl PageObject for ProductPage {
    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::glob("**/prod.html?idp_=*")
    }

    fn page_name(&self) -> &'static str {
        "product"
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
    use crate::driver::LoadState;
    use crate::mock::{MockStorefront, PRODUCT_ADDED};
    use crate::pages::test_support::base_over;
    use crate::pages::NavigateOptions;

    async fn on_product(id: u32) -> (Arc<MockStorefront>, ProductPage) {
        let site = Arc::new(MockStorefront::new());
        let page = ProductPage::new(base_over(&site));
        page.navigate(
            &format!("https://www.demoblaze.com/prod.html?idp_={id}"),
            &NavigateOptions::default().with_load_state(LoadState::Load),
        )
        .await
        .unwrap();
        (site, page)
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_to_cart_accepts_alert() {
        let (site, page) = on_product(1).await;
        let dialog = page.add_to_cart().await.unwrap();
        assert_eq!(dialog.message(), PRODUCT_ADDED);
        assert!(site.was_called("dialog-accepted:Product added."));
        assert_eq!(site.cart_product_names(), vec!["Samsung galaxy s6".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_name_and_price() {
        let (_site, page) = on_product(15).await;
        assert_eq!(page.get_product_name().await.unwrap(), "MacBook Pro");
        assert!((page.get_product_price().await.unwrap() - 1100.0).abs() < f64::EPSILON);
        page.verify_product_details("MacBook Pro", Some(1100.0)).await.unwrap();
        assert_eq!(page.soft().failure_count(), 0);
        page.verify_product_details("MacBook Air", Some(700.0)).await.unwrap();
        assert_eq!(page.soft().failure_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_url_pattern_matches_product_urls() {
        let (_site, page) = on_product(4).await;
        let url = page.page_url().await.unwrap();
        assert!(page.url_pattern().matches(&url));
        page.navigate_home().await.unwrap();
        assert!(!page.url_pattern().matches(&page.page_url().await.unwrap()));
    }
}
