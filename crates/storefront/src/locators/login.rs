use std::ops::Deref;

use crate::locator::Locator;

use super::{CommonLocators, LocatorSet};

/// Login modal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginLocators {
    /// Navbar entries
    pub common: CommonLocators,
    /// Modal container
    pub modal: Locator,
    /// Username input
    pub username_input: Locator,
    /// Password input
    pub password_input: Locator,
    /// "Log in" button inside the modal
    pub submit_button: Locator,
}

impl LoginLocators {
    /// Build the login locators
    #[must_use]
    pub fn new() -> Self {
        Self {
            common: CommonLocators::new(),
            modal: Locator::xpath(r#"//div[@id="logInModal"]"#, "login modal"),
            username_input: Locator::xpath(r#"//input[@id="loginusername"]"#, "login username input"),
            password_input: Locator::xpath(r#"//input[@id="loginpassword"]"#, "login password input"),
            submit_button: Locator::xpath(
                r#"//button[contains(text(),"Log in") and @onclick="logIn()"]"#,
                "login modal Log in button",
            ),
        }
    }
}

impl Default for LoginLocators {
    fn default() -> Self {
        Self::new()
    }
}

impl LocatorSet for LoginLocators {
    fn build() -> Self {
        Self::new()
    }
}

impl Deref for LoginLocators {
    type Target = CommonLocators;

    fn deref(&self) -> &CommonLocators {
        &self.common
    }
}
