use crate::locator::Locator;

use super::LocatorSet;

/// Navbar entries present on every screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonLocators {
    /// "Home" nav link
    pub home_link: Locator,
    /// "Cart" nav link
    pub cart_link: Locator,
    /// "Welcome <user>" label
    pub welcome_text: Locator,
    /// "Log in" nav link
    pub login_link: Locator,
    /// "Log out" nav link
    pub logout_link: Locator,
}

impl CommonLocators {
    /// Build the navbar locators
    #[must_use]
    pub fn new() -> Self {
        Self {
            home_link: Locator::xpath(
                r#"//a[@class="nav-link" and contains(text(),"Home")]"#,
                "navbar Home link",
            ),
            cart_link: Locator::xpath(r#"//a[text()="Cart"]"#, "navbar Cart link"),
            welcome_text: Locator::xpath(r#"//a[@id="nameofuser"]"#, "navbar welcome text"),
            login_link: Locator::xpath(r#"//a[@id="login2"]"#, "navbar Log in link"),
            logout_link: Locator::xpath(r#"//a[@id="logout2"]"#, "navbar Log out link"),
        }
    }
}

impl Default for CommonLocators {
    fn default() -> Self {
        Self::new()
    }
}

impl LocatorSet for CommonLocators {
    fn build() -> Self {
        Self::new()
    }
}
