//! Page objects for the storefront screens.
//!
//! Each page object owns a [`BasePage`] (reached through deref) and a locator
//! registry bound to the same page handle. Operations run as traced steps.

mod base;
mod cart;
mod checkout;
mod home;
mod login;
mod product;

pub use base::{BasePage, NavigateOptions, DEFAULT_CLICK_RETRIES};
pub use cart::{CartItem, CartPage};
pub use checkout::{CheckoutPage, CONFIRMATION_HEADING};
pub use home::HomePage;
pub use login::LoginPage;
pub use product::ProductPage;

use crate::driver::PageHandle;
use crate::url::UrlPattern;

/// URL glob of the home page
pub const HOME_URL_GLOB: &str = "**/index.html";

/// URL glob of the cart page
pub const CART_URL_GLOB: &str = "**/cart.html";

/// A screen of the storefront
pub trait PageObject {
    /// Pattern the page URL matches while this screen is shown
    fn url_pattern(&self) -> UrlPattern;

    /// Name for logs
    fn page_name(&self) -> &'static str;

    /// Shared primitives
    fn base(&self) -> &BasePage;

    /// Rebind to another page handle.
    ///
    /// Locators are rebuilt only when the handle differs from the current
    /// one; returns whether it did.
    fn set_page(&mut self, page: PageHandle) -> bool;
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::BasePage;
    use crate::config::{SettleDelays, SuiteConfig};
    use crate::driver::PageHandle;
    use crate::mock::MockStorefront;
    use crate::soft::SoftHandle;
    use crate::step::Tracer;

    /// Base page over `site` with settle pauses off
    pub fn base_over(site: &Arc<MockStorefront>) -> BasePage {
        let config = SuiteConfig::default().with_settle(SettleDelays::none());
        let soft = SoftHandle::new();
        BasePage::new(
            Arc::clone(site) as PageHandle,
            Arc::new(config),
            soft.clone(),
            Tracer::new().with_soft(soft),
        )
    }
}
