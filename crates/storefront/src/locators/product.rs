use std::ops::Deref;

use crate::locator::Locator;

use super::{CommonLocators, LocatorSet};

/// Product detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLocators {
    /// Navbar entries
    pub common: CommonLocators,
    /// Product name heading
    pub name_heading: Locator,
    /// Price label (`$360 *includes tax`)
    pub price_label: Locator,
    /// "Add to cart" button
    pub add_to_cart_button: Locator,
    /// "Home " link in the product page navbar
    pub back_home_link: Locator,
}

impl ProductLocators {
    /// Build the product page locators
    #[must_use]
    pub fn new() -> Self {
        Self {
            common: CommonLocators::new(),
            name_heading: Locator::xpath(r#"//h2[@class="name"]"#, "product name heading"),
            price_label: Locator::xpath(r#"//h3[@class="price-container"]"#, "product price label"),
            add_to_cart_button: Locator::xpath(
                r#"//a[contains(@onclick,"addToCart")]"#,
                "Add to cart button",
            ),
            back_home_link: Locator::xpath(r#"//a[text()="Home "]"#, "product page Home link"),
        }
    }
}

impl Default for ProductLocators {
    fn default() -> Self {
        Self::new()
    }
}

impl LocatorSet for ProductLocators {
    fn build() -> Self {
        Self::new()
    }
}

impl Deref for ProductLocators {
    type Target = CommonLocators;

    fn deref(&self) -> &CommonLocators {
        &self.common
    }
}
