//! Cart page: rows, total, removal and the Place Order entry point.

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{BasePage, PageObject, CART_URL_GLOB};
use crate::driver::PageHandle;
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::locators::{CartLocators, LocatorRegistry};
use crate::parse::parse_cell_price;
use crate::url::UrlPattern;
use crate::wait::{self, WaitState};

/// Budget for rows that render after the table before an empty cart is trusted
pub const ROW_RENDER_GRACE_MS: u64 = 2_000;

/// One row of the cart table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product name, trimmed
    pub name: String,
    /// Parsed price, 0 when unreadable
    pub price: f64,
}

/// Cart page
#[derive(Debug)]
pub struct CartPage {
    base: BasePage,
    locators: LocatorRegistry<CartLocators>,
}

impl CartPage {
    /// Page object over the base page's handle
    #[must_use]
    pub fn new(base: BasePage) -> Self {
        let locators = LocatorRegistry::new(Arc::clone(base.page()));
        Self { base, locators }
    }

    /// Locators of this screen
    #[must_use]
    pub fn locators(&self) -> &CartLocators {
        &self.locators
    }

    /// Sum of item prices
    #[must_use]
    pub fn calculate_total(items: &[CartItem]) -> f64 {
        items.iter().map(|item| item.price).sum()
    }

    /// Read every rendered row.
    ///
    /// Rows with an empty name cell are skipped.
    pub async fn get_cart_items(&self) -> E2eResult<Vec<CartItem>> {
        self.tracer()
            .step("Get cart items", async {
                self.wait_for_visible(&self.locators.table).await?;
                self.settle(self.config().settle.cart_read_ms, "cart rows render")
                    .await;

                let rows = self.count(&self.locators.item_rows).await?;
                let mut items = Vec::with_capacity(rows);
                for i in 0..rows {
                    let name = self
                        .page()
                        .text_content(&self.locators.item_name(i))
                        .await?
                        .unwrap_or_default();
                    let price_text = self
                        .page()
                        .text_content(&self.locators.item_price(i))
                        .await?
                        .unwrap_or_default();
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    items.push(CartItem {
                        name: name.to_string(),
                        price: parse_cell_price(&price_text),
                    });
                }
                tracing::info!(count = items.len(), "cart items read");
                Ok(items)
            })
            .await
    }

    /// Rows right now, without waiting
    pub async fn item_count(&self) -> E2eResult<usize> {
        self.count(&self.locators.item_rows).await
    }

    /// Soft check that a product is in the cart, ignoring case
    pub async fn verify_cart_contains_product(&self, name: &str) -> E2eResult<()> {
        self.tracer()
            .step(&format!("Verify cart contains product: {name}"), async {
                let items = self.get_cart_items().await?;
                let wanted = name.to_lowercase();
                let found = items.iter().any(|item| item.name.to_lowercase() == wanted);
                self.soft()
                    .assert_true(found, &format!("cart should contain '{name}'"));
                Ok(())
            })
            .await
    }

    /// Poll the row count until it equals `expected`.
    ///
    /// A different count when the budget runs out is a soft failure; the
    /// last observed count is returned either way.
    pub async fn verify_cart_item_count(&self, expected: usize) -> E2eResult<usize> {
        self.tracer()
            .step(&format!("Verify cart item count: {expected}"), async {
                self.wait_for_visible(&self.locators.table).await?;
                self.settle(self.config().settle.cart_count_ms, "cart rows load")
                    .await;
                let observed = wait::wait_for_count(
                    self.driver(),
                    &self.locators.item_rows,
                    &self.config().wait_options(),
                    |count| count == expected,
                )
                .await?;
                self.soft()
                    .assert_eq(&observed.count, &expected, "cart item count");
                Ok(observed.count)
            })
            .await
    }

    /// Total label as a number, 0 when empty
    pub async fn get_total(&self) -> E2eResult<f64> {
        self.tracer()
            .step("Get cart total", async {
                self.wait_for_visible(&self.locators.total).await?;
                let text = self.get_text(&self.locators.total).await?;
                Ok(parse_cell_price(&text))
            })
            .await
    }

    /// Soft exact comparison of the total
    pub async fn verify_total(&self, expected: f64) -> E2eResult<()> {
        self.tracer()
            .step("Verify cart total", async {
                let actual = self.get_total().await?;
                self.soft().assert_eq(&actual, &expected, "cart total");
                Ok(())
            })
            .await
    }

    /// Delete the row for `name` and wait until it is gone.
    ///
    /// The click and the disappearance wait run together, so a row that
    /// vanishes before the click returns is still observed. A row counts as
    /// gone once it is detached or hidden, under one wait budget.
    pub async fn remove_item(&self, name: &str) -> E2eResult<()> {
        self.tracer()
            .step(&format!("Remove item from cart: {name}"), async {
                let delete = self.locators.delete_button(name);
                self.wait_for_visible(&delete).await?;
                let matches = self.count(&delete).await?;
                let first = delete.first();
                // the last match detaches once any one matching row is removed
                let last = delete.nth(matches.saturating_sub(1));
                futures::try_join!(self.click(&first), self.wait_for_removal(&last))?;
                Ok(())
            })
            .await
    }

    async fn wait_for_removal(&self, locator: &Locator) -> E2eResult<()> {
        let driver = self.driver();
        let detached = AtomicBool::new(false);
        let seen_detached = &detached;
        let description = format!("{locator} to be removed");
        let result = wait::wait_until(&description, &self.config().wait_options(), || async move {
            let probe = driver.probe(locator).await?;
            seen_detached.store(!probe.attached, Ordering::Relaxed);
            Ok(WaitState::Hidden.satisfied_by(&probe))
        })
        .await?;
        let state = if detached.load(Ordering::Relaxed) {
            WaitState::Detached
        } else {
            WaitState::Hidden
        };
        tracing::debug!(%locator, %state, polls = result.polls, "row removed");
        Ok(())
    }

    /// Delete rows one at a time until none are left.
    ///
    /// Each click must take the count down; a drop other than exactly one is
    /// recorded as a soft failure, no drop at all is a timeout. An initial
    /// count of zero is only trusted after rows have had
    /// [`ROW_RENDER_GRACE_MS`] to render, so late rows are not missed when
    /// settle delays are off.
    pub async fn clear_cart(&self) -> E2eResult<()> {
        self.tracer()
            .step("Clear all cart items", async {
                self.wait_for_visible(&self.locators.table).await?;
                self.settle(self.config().settle.cart_count_ms, "cart rows load")
                    .await;

                let links = &self.locators.delete_links;
                let mut remaining = self.count(links).await?;
                if remaining == 0 {
                    remaining = wait::wait_for_count(
                        self.driver(),
                        links,
                        &self.config().wait_options_for(ROW_RENDER_GRACE_MS),
                        |count| count > 0,
                    )
                    .await?
                    .count;
                }
                while remaining > 0 {
                    self.click(&links.first()).await?;
                    let before = remaining;
                    let observed = wait::wait_for_count(
                        self.driver(),
                        links,
                        &self.config().wait_options(),
                        |count| count < before,
                    )
                    .await?;
                    if !observed.satisfied {
                        return Err(E2eError::Timeout {
                            waiting_for: format!("cart to drop below {before} rows"),
                            ms: self.config().timeouts.default_ms,
                        });
                    }
                    self.soft().assert_eq(
                        &(before - observed.count),
                        &1,
                        "one row removed per delete click",
                    );
                    remaining = observed.count;
                }
                Ok(())
            })
            .await
    }

    /// Open the order form
    pub async fn click_place_order(&self) -> E2eResult<()> {
        self.tracer()
            .step("Click Place Order", self.click(&self.locators.place_order_button))
            .await
    }
}

impl Deref for CartPage {
    type Target = BasePage;

    fn deref(&self) -> &BasePage {
        &self.base
    }
}

impl PageObject for CartPage {
    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::glob(CART_URL_GLOB)
    }

    fn page_name(&self) -> &'static str {
        "cart"
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
    use std::time::Duration;

    use tokio::time::Instant;

    use crate::mock::MockStorefront;
    use crate::pages::test_support::base_over;
    use crate::pages::NavigateOptions;

    async fn cart_with(site: MockStorefront, names: &[&str]) -> (Arc<MockStorefront>, CartPage) {
        site.seed_cart(names).unwrap();
        let site = Arc::new(site);
        let page = CartPage::new(base_over(&site));
        page.navigate("https://www.demoblaze.com/cart.html", &NavigateOptions::default())
            .await
            .unwrap();
        (site, page)
    }

    fn item(name: &str, price: f64) -> CartItem {
        CartItem {
            name: name.to_string(),
            price,
        }
    }

    mod read_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_items_after_count_poll() {
            let (_site, page) = cart_with(MockStorefront::new(), &["Nexus 6", "MacBook Pro"]).await;
            assert_eq!(page.verify_cart_item_count(2).await.unwrap(), 2);
            let items = page.get_cart_items().await.unwrap();
            assert_eq!(items, vec![item("Nexus 6", 650.0), item("MacBook Pro", 1100.0)]);
            assert_eq!(page.get_cart_items().await.unwrap(), items);
            page.verify_total(CartPage::calculate_total(&items)).await.unwrap();
            assert_eq!(page.soft().failure_count(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_count_mismatch_is_soft() {
            let (_site, page) = cart_with(MockStorefront::new(), &["Nexus 6"]).await;
            assert_eq!(page.verify_cart_item_count(3).await.unwrap(), 1);
            assert_eq!(page.soft().failure_count(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_empty_cart_total_is_zero() {
            let (_site, page) = cart_with(MockStorefront::new(), &[]).await;
            assert_eq!(page.item_count().await.unwrap(), 0);
            assert!(page.get_total().await.unwrap().abs() < f64::EPSILON);
            assert!(page.get_cart_items().await.unwrap().is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_contains_product_ignores_case() {
            let (_site, page) =
                cart_with(MockStorefront::new().with_render_delay(Duration::ZERO), &["MacBook air"]).await;
            page.verify_cart_contains_product("MacBook Air").await.unwrap();
            page.verify_cart_contains_product("Nexus 6").await.unwrap();
            assert_eq!(page.soft().failure_count(), 1);
        }

        #[test]
        fn test_calculate_total() {
            assert!(CartPage::calculate_total(&[]).abs() < f64::EPSILON);
            let total = CartPage::calculate_total(&[item("a", 360.0), item("b", 1100.0)]);
            assert!((total - 1460.0).abs() < f64::EPSILON);
        }
    }

    mod removal_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_remove_item_waits_for_detach() {
            let (site, page) =
                cart_with(MockStorefront::new(), &["Sony xperia z5", "MacBook air"]).await;
            page.verify_cart_item_count(2).await.unwrap();
            page.remove_item("Sony xperia z5").await.unwrap();
            assert_eq!(page.item_count().await.unwrap(), 1);
            assert_eq!(site.cart_product_names(), vec!["MacBook air".to_string()]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_remove_one_of_duplicates() {
            let (site, page) = cart_with(MockStorefront::new(), &["Nexus 6", "Nexus 6"]).await;
            page.verify_cart_item_count(2).await.unwrap();
            page.remove_item("Nexus 6").await.unwrap();
            assert_eq!(site.cart_product_names().len(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_remove_absent_item_times_out() {
            let (_site, page) = cart_with(MockStorefront::new(), &["Nexus 6"]).await;
            let err = page.remove_item("HTC One M9").await.unwrap_err();
            assert!(err.is_timeout());
        }

        #[tokio::test(start_paused = true)]
        async fn test_clear_cart_is_fixed_point() {
            let (site, page) =
                cart_with(MockStorefront::new(), &["Nexus 6", "HTC One M9", "MacBook Pro"]).await;
            page.verify_cart_item_count(3).await.unwrap();
            page.clear_cart().await.unwrap();
            assert_eq!(page.item_count().await.unwrap(), 0);
            assert!(site.cart_product_names().is_empty());

            let clicks = site.history().iter().filter(|c| c.starts_with("click:")).count();
            page.clear_cart().await.unwrap();
            let clicks_after = site.history().iter().filter(|c| c.starts_with("click:")).count();
            assert_eq!(clicks, clicks_after);
            assert_eq!(page.soft().failure_count(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_remove_item_accepts_hidden_row() {
            let (site, page) = cart_with(
                MockStorefront::new().with_hidden_removal(),
                &["Sony xperia z5", "MacBook air"],
            )
            .await;
            page.verify_cart_item_count(2).await.unwrap();

            let start = Instant::now();
            page.remove_item("Sony xperia z5").await.unwrap();
            assert!(start.elapsed() < Duration::from_secs(1));

            let delete = page.locators().delete_button("Sony xperia z5");
            let probe = page.driver().probe(&delete).await.unwrap();
            assert!(probe.attached && !probe.visible);
            assert_eq!(site.cart_product_names(), vec!["MacBook air".to_string()]);
            page.verify_total(700.0).await.unwrap();
            assert_eq!(page.soft().failure_count(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_row_that_stays_fails_after_one_budget() {
            let (_site, page) = cart_with(
                MockStorefront::new().with_removal_delay(Duration::from_secs(120)),
                &["Nexus 6"],
            )
            .await;
            page.verify_cart_item_count(1).await.unwrap();

            let start = Instant::now();
            let err = page.remove_item("Nexus 6").await.unwrap_err();
            assert!(err.is_timeout());
            let budget = Duration::from_millis(page.config().timeouts.default_ms);
            assert!(start.elapsed() >= budget);
            assert!(start.elapsed() < budget + Duration::from_secs(1));
        }

        #[tokio::test(start_paused = true)]
        async fn test_clear_cart_waits_for_late_rows() {
            let (site, page) = cart_with(
                MockStorefront::new().with_render_delay(Duration::from_millis(800)),
                &["Nexus 6", "MacBook Pro"],
            )
            .await;
            assert_eq!(page.item_count().await.unwrap(), 0);

            page.clear_cart().await.unwrap();
            assert!(site.cart_product_names().is_empty());
            assert_eq!(page.item_count().await.unwrap(), 0);
            assert_eq!(page.soft().failure_count(), 0);
        }
    }
}
