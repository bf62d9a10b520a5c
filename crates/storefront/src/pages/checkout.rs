//! Order form and purchase confirmation.

use std::ops::Deref;
use std::sync::Arc;

use super::{BasePage, PageObject, CART_URL_GLOB};
use crate::data::CheckoutFormData;
use crate::driver::PageHandle;
use crate::error::E2eResult;
use crate::locators::{CheckoutLocators, LocatorRegistry};
use crate::parse::{parse_order_amount, parse_order_id, OrderConfirmation};
use crate::url::UrlPattern;

/// Heading of the purchase confirmation
pub const CONFIRMATION_HEADING: &str = "Thank you for your purchase!";

/// Checkout flow, shown over the cart page
#[derive(Debug)]
pub struct CheckoutPage {
    base: BasePage,
    locators: LocatorRegistry<CheckoutLocators>,
}

impl CheckoutPage {
    /// Page object over the base page's handle
    #[must_use]
    pub fn new(base: BasePage) -> Self {
        let locators = LocatorRegistry::new(Arc::clone(base.page()));
        Self { base, locators }
    }

    /// Locators of this screen
    #[must_use]
    pub fn locators(&self) -> &CheckoutLocators {
        &self.locators
    }

    /// Fill the six order fields, clicking each before typing
    pub async fn fill_checkout_form(&self, data: &CheckoutFormData) -> E2eResult<()> {
        self.tracer()
            .step("Fill checkout form", async {
                self.wait_for_visible(&self.locators.order_modal).await?;
                let values = [
                    data.name.as_str(),
                    data.country.as_str(),
                    data.city.as_str(),
                    data.credit_card.as_str(),
                    data.month.as_str(),
                    data.year.as_str(),
                ];
                for (input, value) in self.locators.form_inputs().into_iter().zip(values) {
                    self.click(input).await?;
                    self.fill(input, value).await?;
                }
                Ok(())
            })
            .await
    }

    /// Submit the order and wait for the confirmation
    pub async fn click_purchase(&self) -> E2eResult<()> {
        self.tracer()
            .step("Click Purchase button", async {
                self.click(&self.locators.purchase_button).await?;
                self.wait_for_visible(&self.locators.confirmation_modal).await
            })
            .await
    }

    /// Soft check of the confirmation heading
    pub async fn verify_order_confirmation(&self) -> E2eResult<()> {
        self.tracer()
            .step("Verify order confirmation", async {
                self.wait_for_visible(&self.locators.confirmation_heading)
                    .await?;
                let heading = self.get_text(&self.locators.confirmation_heading).await?;
                self.soft()
                    .assert_contains(&heading, CONFIRMATION_HEADING, "confirmation heading");
                Ok(())
            })
            .await
    }

    /// Order id from the confirmation, `""` when missing
    pub async fn get_order_id(&self) -> E2eResult<String> {
        self.tracer()
            .step("Get order ID", async {
                let details = self.get_text(&self.locators.confirmation_details).await?;
                Ok(parse_order_id(&details))
            })
            .await
    }

    /// Charged amount from the confirmation, 0 when missing
    pub async fn get_order_amount(&self) -> E2eResult<f64> {
        self.tracer()
            .step("Get order amount", async {
                let details = self.get_text(&self.locators.confirmation_details).await?;
                Ok(parse_order_amount(&details))
            })
            .await
    }

    /// Id and amount in one read
    pub async fn order_confirmation(&self) -> E2eResult<OrderConfirmation> {
        self.tracer()
            .step("Read order confirmation", async {
                let details = self.get_text(&self.locators.confirmation_details).await?;
                Ok(OrderConfirmation::parse(&details))
            })
            .await
    }

    /// Dismiss the confirmation and wait for it to go away
    pub async fn close_confirmation(&self) -> E2eResult<()> {
        self.tracer()
            .step("Close confirmation modal", async {
                self.settle(
                    self.config().settle.before_confirmation_close_ms,
                    "confirmation animation",
                )
                .await;
                self.click(&self.locators.confirmation_ok_button).await?;
                self.wait_for_hidden(&self.locators.confirmation_modal).await
            })
            .await
    }

    /// Fill, purchase, verify, read the confirmation and close it
    pub async fn complete_purchase(&self, data: &CheckoutFormData) -> E2eResult<OrderConfirmation> {
        self.tracer()
            .step("Complete purchase", async {
                self.fill_checkout_form(data).await?;
                self.click_purchase().await?;
                self.verify_order_confirmation().await?;
                let confirmation = self.order_confirmation().await?;
                self.close_confirmation().await?;
                Ok(confirmation)
            })
            .await
    }

    /// Wait for the navbar Home link after the purchase
    pub async fn verify_home_success(&self) -> E2eResult<()> {
        self.tracer()
            .step("Verify home success", self.wait_for_visible(&self.locators.home_link))
            .await
    }
}

impl Deref for CheckoutPage {
    type Target = BasePage;

    fn deref(&self) -> &BasePage {
        &self.base
    }
}

impl PageObject for CheckoutPage {
    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::glob(CART_URL_GLOB)
    }

    fn page_name(&self) -> &'static str {
        "checkout"
    }

    fn base(&self) -> &BasePage {
        &self.base
    }

    fn set_page(&mut self, page: PageHandle) -> bool {
        self.base.set_page(Arc::clone(&page));
        self.locators.set_page(page)
    }
}
