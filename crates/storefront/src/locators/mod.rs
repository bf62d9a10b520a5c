//! Locator registries.
//!
//! One registry per screen. Each holds pure [`Locator`](crate::locator::Locator)
//! values and embeds [`CommonLocators`] for the navbar, reachable through
//! auto-deref the same way page-specific fields are.

mod cart;
mod checkout;
mod common;
mod home;
mod login;
mod product;

use std::ops::Deref;
use std::sync::Arc;

pub use cart::CartLocators;
pub use checkout::CheckoutLocators;
pub use common::CommonLocators;
pub use home::HomeLocators;
pub use login::LoginLocators;
pub use product::ProductLocators;

use crate::driver::{same_page, PageHandle};
use crate::locator::Locator;

/// A set of locators built in one go
pub trait LocatorSet: Sized {
    /// Build every locator in the set
    fn build() -> Self;
}

/// Locator set bound to a page handle
pub struct LocatorRegistry<L> {
    page: PageHandle,
    set: L,
    initializations: u32,
}

impl<L: LocatorSet> LocatorRegistry<L> {
    /// Bind a fresh set to `page`
    #[must_use]
    pub fn new(page: PageHandle) -> Self {
        Self {
            page,
            set: L::build(),
            initializations: 1,
        }
    }

    /// Rebind to another page.
    ///
    /// Rebuilds the set only when `page` is a different handle; returns
    /// whether it did.
    pub fn set_page(&mut self, page: PageHandle) -> bool {
        if same_page(&self.page, &page) {
            return false;
        }
        self.page = page;
        self.set = L::build();
        self.initializations += 1;
        true
    }

    /// Bound page
    #[must_use]
    pub fn page(&self) -> &PageHandle {
        &self.page
    }

    /// How many times the set has been built
    #[must_use]
    pub const fn initializations(&self) -> u32 {
        self.initializations
    }
}

impl<L> Deref for LocatorRegistry<L> {
    type Target = L;

    fn deref(&self) -> &L {
        &self.set
    }
}

impl<L: std::fmt::Debug> std::fmt::Debug for LocatorRegistry<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocatorRegistry")
            .field("page", &Arc::as_ptr(&self.page).cast::<()>())
            .field("set", &self.set)
            .field("initializations", &self.initializations)
            .finish()
    }
}

/// Quote a string as an XPath literal.
///
/// XPath 1.0 has no escapes, so text holding both quote kinds becomes a
/// `concat(...)` call.
#[must_use]
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    let parts: Vec<String> = text
        .split('"')
        .map(|part| format!("\"{part}\""))
        .collect();
    format!("concat({})", parts.join(", '\"', "))
}

/// Element whose own text, with whitespace normalized, equals `text`
#[must_use]
pub fn by_text(text: &str) -> Locator {
    let text = text.trim();
    Locator::xpath(
        format!("//body//*[normalize-space(text())={}]", xpath_literal(text)),
        format!("text \"{text}\""),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::PageHandle;
    use crate::mock::MockStorefront;

    #[test]
    fn test_set_page_same_handle_is_noop() {
        let page: PageHandle = Arc::new(MockStorefront::new());
        let mut registry: LocatorRegistry<LoginLocators> = LocatorRegistry::new(Arc::clone(&page));
        assert!(!registry.set_page(Arc::clone(&page)));
        assert_eq!(registry.initializations(), 1);
    }

    #[test]
    fn test_set_page_new_handle_rebuilds() {
        let first: PageHandle = Arc::new(MockStorefront::new());
        let second: PageHandle = Arc::new(MockStorefront::new());
        let mut registry: LocatorRegistry<CartLocators> = LocatorRegistry::new(first);
        assert!(registry.set_page(Arc::clone(&second)));
        assert_eq!(registry.initializations(), 2);
        assert!(same_page(registry.page(), &second));
    }

    #[test]
    fn test_common_fields_reachable_through_registry() {
        let page: PageHandle = Arc::new(MockStorefront::new());
        let registry: LocatorRegistry<HomeLocators> = LocatorRegistry::new(page);
        assert_eq!(
            registry.logout_link.selector().expression(),
            r#"//a[@id="logout2"]"#
        );
    }

    #[test]
    fn test_by_text_trims_and_quotes() {
        let locator = by_text("  Log in ");
        assert_eq!(
            locator.selector().expression(),
            r#"//body//*[normalize-space(text())="Log in"]"#
        );
        assert_eq!(locator.description(), "text \"Log in\"");
        assert_eq!(by_text("Log in"), locator);
    }

    #[test]
    fn test_xpath_literal_quoting() {
        assert_eq!(xpath_literal("Nexus 6"), "\"Nexus 6\"");
        assert_eq!(xpath_literal("24\" monitor"), "'24\" monitor'");
        assert_eq!(
            xpath_literal("Bob's 24\" monitor"),
            "concat(\"Bob's 24\", '\"', \" monitor\")"
        );
    }
}
