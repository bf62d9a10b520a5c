use std::ops::Deref;

use crate::locator::Locator;

use super::{xpath_literal, CommonLocators, LocatorSet};

/// Cart page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLocators {
    /// Navbar entries
    pub common: CommonLocators,
    /// Cart table
    pub table: Locator,
    /// Rendered item rows
    pub item_rows: Locator,
    /// Cart total heading
    pub total: Locator,
    /// "Place Order" button
    pub place_order_button: Locator,
    /// Every "Delete" link in the cart body
    pub delete_links: Locator,
}

impl CartLocators {
    /// Build the cart locators
    #[must_use]
    pub fn new() -> Self {
        Self {
            common: CommonLocators::new(),
            table: Locator::xpath(
                r#"//table[@class="table table-bordered table-hover table-striped"]"#,
                "cart table",
            ),
            item_rows: Locator::xpath(
                r#"//tbody[@id="tbodyid"]/tr[contains(@class,"success")]"#,
                "cart item rows",
            ),
            total: Locator::xpath(r#"//h3[@id="totalp"]"#, "cart total"),
            place_order_button: Locator::xpath(
                r#"//button[contains(text(),"Place Order")]"#,
                "Place Order button",
            ),
            delete_links: Locator::xpath(
                r#"//tbody[@id="tbodyid"]//a[contains(text(),"Delete")]"#,
                "cart Delete links",
            ),
        }
    }

    /// Row at `index`
    #[must_use]
    pub fn row(&self, index: usize) -> Locator {
        self.item_rows.nth(index)
    }

    /// Name cell of the row at `index`
    #[must_use]
    pub fn item_name(&self, index: usize) -> Locator {
        self.row(index).child("td[2]", format!("cart row {index} name"))
    }

    /// Price cell of the row at `index`
    #[must_use]
    pub fn item_price(&self, index: usize) -> Locator {
        self.row(index).child("td[3]", format!("cart row {index} price"))
    }

    /// "Delete" link of the row whose name cell contains `product_name`
    #[must_use]
    pub fn delete_button(&self, product_name: &str) -> Locator {
        Locator::xpath(
            format!(
                r#"//tr[td[contains(text(),{})]]//a[contains(text(),"Delete")]"#,
                xpath_literal(product_name)
            ),
            format!("Delete link for '{product_name}'"),
        )
    }
}

impl Default for CartLocators {
    fn default() -> Self {
        Self::new()
    }
}

impl LocatorSet for CartLocators {
    fn build() -> Self {
        Self::new()
    }
}

impl Deref for CartLocators {
    type Target = CommonLocators;

    fn deref(&self) -> &CommonLocators {
        &self.common
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_cells_scoped_to_row() {
        let cart = CartLocators::new();
        assert_eq!(
            cart.item_price(0).selector().expression(),
            r#"(//tbody[@id="tbodyid"]/tr[contains(@class,"success")])[1]/td[3]"#
        );
    }

    #[test]
    fn test_delete_button_by_name() {
        let cart = CartLocators::new();
        assert_eq!(
            cart.delete_button("Nokia lumia 1520").selector().expression(),
            r#"//tr[td[contains(text(),"Nokia lumia 1520")]]//a[contains(text(),"Delete")]"#
        );
    }
}
