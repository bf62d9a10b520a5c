use std::ops::Deref;

use crate::data::Category;
use crate::locator::Locator;

use super::{xpath_literal, CommonLocators, LocatorSet};

/// Home page: category sidebar and product grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLocators {
    /// Navbar entries
    pub common: CommonLocators,
    /// "Phones" category link
    pub category_phones: Locator,
    /// "Laptops" category link
    pub category_laptops: Locator,
    /// "Monitors" category link
    pub category_monitors: Locator,
    /// Product cards in the grid
    pub product_cards: Locator,
}

fn category_link(category: Category) -> Locator {
    Locator::xpath(
        format!(
            r#"//a[contains(text(),"{category}") and @onclick="byCat('{}')"]"#,
            category.slug()
        ),
        format!("{category} category link"),
    )
}

impl HomeLocators {
    /// Build the home page locators
    #[must_use]
    pub fn new() -> Self {
        Self {
            common: CommonLocators::new(),
            category_phones: category_link(Category::Phones),
            category_laptops: category_link(Category::Laptops),
            category_monitors: category_link(Category::Monitors),
            product_cards: Locator::xpath(r#"//div[@id="tbodyid"]//a[@class="hrefch"]"#, "product card titles"),
        }
    }

    /// Sidebar link for a category
    #[must_use]
    pub const fn category(&self, category: Category) -> &Locator {
        match category {
            Category::Phones => &self.category_phones,
            Category::Laptops => &self.category_laptops,
            Category::Monitors => &self.category_monitors,
        }
    }

    /// Product title link in the grid, matched by exact text
    #[must_use]
    pub fn product_link(&self, name: &str) -> Locator {
        Locator::xpath(
            format!(r#"//a[text()={} and @class="hrefch"]"#, xpath_literal(name)),
            format!("product link '{name}'"),
        )
    }
}

impl Default for HomeLocators {
    fn default() -> Self {
        Self::new()
    }
}

impl LocatorSet for HomeLocators {
    fn build() -> Self {
        Self::new()
    }
}

impl Deref for HomeLocators {
    type Target = CommonLocators;

    fn deref(&self) -> &CommonLocators {
        &self.common
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_selectors() {
        let home = HomeLocators::new();
        assert_eq!(
            home.category(Category::Laptops).selector().expression(),
            r#"//a[contains(text(),"Laptops") and @onclick="byCat('notebook')"]"#
        );
    }

    #[test]
    fn test_product_link_is_parameterized() {
        let home = HomeLocators::new();
        assert_eq!(
            home.product_link("Nexus 6").selector().expression(),
            r#"//a[text()="Nexus 6" and @class="hrefch"]"#
        );
        assert_eq!(home.product_link("Nexus 6"), home.product_link("Nexus 6"));
        assert_ne!(home.product_link("Nexus 6"), home.product_link("MacBook Pro"));
    }
}
