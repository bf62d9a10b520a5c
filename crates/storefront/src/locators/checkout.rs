use std::ops::Deref;

use crate::locator::Locator;

use super::{CommonLocators, LocatorSet};

/// Place-order modal and purchase confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLocators {
    /// Navbar entries
    pub common: CommonLocators,
    /// Order modal container
    pub order_modal: Locator,
    /// Name input
    pub name_input: Locator,
    /// Country input
    pub country_input: Locator,
    /// City input
    pub city_input: Locator,
    /// Credit card input
    pub card_input: Locator,
    /// Month input
    pub month_input: Locator,
    /// Year input
    pub year_input: Locator,
    /// "Purchase" button
    pub purchase_button: Locator,
    /// Sweet-alert confirmation
    pub confirmation_modal: Locator,
    /// Confirmation heading
    pub confirmation_heading: Locator,
    /// Order details paragraph
    pub confirmation_details: Locator,
    /// Confirmation "OK" button
    pub confirmation_ok_button: Locator,
}

fn input(id: &str) -> Locator {
    Locator::xpath(format!(r#"//input[@id="{id}"]"#), format!("order form {id} input"))
}

impl CheckoutLocators {
    /// Build the checkout locators
    #[must_use]
    pub fn new() -> Self {
        Self {
            common: CommonLocators::new(),
            order_modal: Locator::xpath(r#"//div[@id="orderModal"]"#, "order modal"),
            name_input: input("name"),
            country_input: input("country"),
            city_input: input("city"),
            card_input: input("card"),
            month_input: input("month"),
            year_input: input("year"),
            purchase_button: Locator::xpath(
                r#"//button[@onclick="purchaseOrder()"]"#,
                "Purchase button",
            ),
            confirmation_modal: Locator::xpath(
                r#"//div[contains(@class,"sweet-alert") and contains(@class,"showSweetAlert")]"#,
                "purchase confirmation",
            ),
            confirmation_heading: Locator::xpath(
                r#"//h2[contains(text(),"Thank you for your purchase!")]"#,
                "confirmation heading",
            ),
            confirmation_details: Locator::xpath(
                r#"//p[@class="lead text-muted "]"#,
                "confirmation details",
            ),
            confirmation_ok_button: Locator::xpath(
                r#"//button[contains(text(),"OK")]"#,
                "confirmation OK button",
            ),
        }
    }

    /// The six form inputs in fill order
    #[must_use]
    pub fn form_inputs(&self) -> [&Locator; 6] {
        [
            &self.name_input,
            &self.country_input,
            &self.city_input,
            &self.card_input,
            &self.month_input,
            &self.year_input,
        ]
    }
}

impl Default for CheckoutLocators {
    fn default() -> Self {
        Self::new()
    }
}

impl LocatorSet for CheckoutLocators {
    fn build() -> Self {
        Self::new()
    }
}

impl Deref for CheckoutLocators {
    type Target = CommonLocators;

    fn deref(&self) -> &CommonLocators {
        &self.common
    }
}
