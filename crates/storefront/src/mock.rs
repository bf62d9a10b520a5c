//! In-memory DemoBlaze storefront.
//!
//! `MockStorefront` implements [`BrowserDriver`] by resolving the suite's own
//! locators against a simulated page: navbar, login modal, home grid,
//! product page, cart and order flow. It keeps the behaviors the suite has
//! to synchronize with:
//!
//! - cart rows render some time after the cart page loads
//! - deleted rows stay attached until the storefront re-renders the table,
//!   or stay hidden in place until the next load with
//!   [`MockStorefront::with_hidden_removal`]
//! - add-to-cart and failed logins open native alerts
//! - the cart lives server-side and survives navigation
//!
//! Time is read from the tokio clock, so paused-clock tests exercise every
//! delay without waiting for it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::data::Category;
use crate::dialog::{dialog_channel, Dialog, DialogAction, DialogSender, DialogSubscription};
use crate::driver::{
    BrowserDriver, ClickOptions, ElementProbe, LoadState, MouseEvent, NavigationResponse,
};
use crate::error::{E2eError, E2eResult};
use crate::locator::{BoundingBox, Locator, Selector};
use crate::locators::{
    by_text, CartLocators, CheckoutLocators, HomeLocators, LoginLocators, ProductLocators,
};

/// Default storefront origin
pub const MOCK_BASE_URL: &str = "https://www.demoblaze.com";

/// PNG signature followed by a marker, enough for screenshot plumbing
const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nmock-storefront";

/// Alert text after adding a product
pub const PRODUCT_ADDED: &str = "Product added.";

/// One catalog entry (id, name, category, price)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    /// Storefront id (`prod.html?idp_=<id>`)
    pub id: u32,
    /// Display name
    pub name: String,
    /// Category
    pub category: Category,
    /// Price in whole dollars
    pub price: u32,
}

fn demoblaze_catalog() -> Vec<CatalogItem> {
    [
        (1, "Samsung galaxy s6", Category::Phones, 360),
        (2, "Nokia lumia 1520", Category::Phones, 820),
        (3, "Nexus 6", Category::Phones, 650),
        (4, "Samsung galaxy s7", Category::Phones, 800),
        (5, "Iphone 6 32gb", Category::Phones, 790),
        (6, "Sony xperia z5", Category::Phones, 320),
        (7, "HTC One M9", Category::Phones, 700),
        (8, "Sony vaio i5", Category::Laptops, 790),
        (9, "Sony vaio i7", Category::Laptops, 790),
        (10, "Apple monitor 24", Category::Monitors, 400),
        (11, "MacBook air", Category::Laptops, 700),
        (12, "Dell i7 8gb", Category::Laptops, 700),
        (13, "2017 Dell 15.6 Inch", Category::Laptops, 700),
        (14, "ASUS Full HD", Category::Monitors, 230),
        (15, "MacBook Pro", Category::Laptops, 1100),
    ]
    .into_iter()
    .map(|(id, name, category, price)| CatalogItem {
        id,
        name: name.to_string(),
        category,
        price,
    })
    .collect()
}

/// A completed purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    /// Order id shown in the confirmation
    pub id: u64,
    /// Charged amount
    pub amount: u32,
    /// Buyer name
    pub name: String,
    /// Card number
    pub card: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Blank,
    Home { category: Option<Category> },
    Product(u32),
    Cart { loaded_at: Instant },
}

#[derive(Debug, Clone)]
struct CartEntry {
    entry_id: u64,
    product_id: u32,
    removed_at: Option<Instant>,
    hidden_at: Option<Instant>,
}

impl CartEntry {
    const fn new(entry_id: u64, product_id: u32) -> Self {
        Self {
            entry_id,
            product_id,
            removed_at: None,
            hidden_at: None,
        }
    }

    fn present_at(&self, now: Instant) -> bool {
        self.removed_at.map_or(true, |at| now < at)
    }

    fn shown_at(&self, now: Instant) -> bool {
        self.hidden_at.map_or(true, |at| now < at)
    }

    fn in_cart_at(&self, now: Instant) -> bool {
        self.present_at(now) && self.shown_at(now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    HomeLink,
    BackHomeLink,
    CartLink,
    LoginLink,
    LogoutLink,
    WelcomeText,
    LoginModal,
    Input(&'static str),
    LoginSubmit,
    Category(Category),
    ProductCard(u32),
    ProductName,
    ProductPrice,
    AddToCart,
    CartTable,
    CartRow(u64),
    CartCell(u64),
    CartTotal,
    PlaceOrder,
    Delete(u64),
    OrderModal,
    Purchase,
    Confirmation,
    ConfirmationHeading,
    ConfirmationDetails,
    ConfirmationOk,
}

#[derive(Debug, Clone)]
struct Node {
    target: Target,
    text: String,
    visible: bool,
    editable: bool,
}

impl Node {
    fn new(target: Target, text: impl Into<String>, visible: bool) -> Self {
        Self {
            target,
            text: text.into(),
            visible,
            editable: false,
        }
    }

    fn input(name: &'static str, value: &str, visible: bool) -> Self {
        Self {
            target: Target::Input(name),
            text: value.to_string(),
            visible,
            editable: true,
        }
    }
}

#[derive(Debug)]
struct SiteState {
    screen: Screen,
    url: String,
    user: Option<String>,
    accounts: HashMap<String, String>,
    login_modal_open: bool,
    order_modal_open: bool,
    confirmation: Option<PlacedOrder>,
    inputs: HashMap<&'static str, String>,
    cart: Vec<CartEntry>,
    orders: Vec<PlacedOrder>,
    next_entry_id: u64,
    next_order_id: u64,
    open_dialog: Option<Dialog>,
    disabled: Vec<(Locator, Instant)>,
    intercepted: HashMap<Locator, u32>,
    history: Vec<String>,
    mouse: Vec<MouseEvent>,
}

/// Simulated DemoBlaze storefront
#[derive(Debug)]
pub struct MockStorefront {
    base_url: String,
    catalog: Vec<CatalogItem>,
    render_delay: Duration,
    removal_delay: Duration,
    hide_removed: bool,
    state: Mutex<SiteState>,
    dialog_subscribers: Mutex<Vec<DialogSender>>,
    closed: AtomicBool,
    fixed: Vec<(Selector, Target)>,
    home: HomeLocators,
    cart: CartLocators,
}

impl Default for MockStorefront {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorefront {
    /// Storefront with the DemoBlaze catalog and the bundled fixture accounts
    #[must_use]
    pub fn new() -> Self {
        let login = LoginLocators::new();
        let home = HomeLocators::new();
        let product = ProductLocators::new();
        let cart = CartLocators::new();
        let checkout = CheckoutLocators::new();

        let mut fixed = vec![
            (login.home_link.selector().clone(), Target::HomeLink),
            (login.cart_link.selector().clone(), Target::CartLink),
            (login.login_link.selector().clone(), Target::LoginLink),
            (login.logout_link.selector().clone(), Target::LogoutLink),
            (login.welcome_text.selector().clone(), Target::WelcomeText),
            (login.modal.selector().clone(), Target::LoginModal),
            (login.username_input.selector().clone(), Target::Input("loginusername")),
            (login.password_input.selector().clone(), Target::Input("loginpassword")),
            (login.submit_button.selector().clone(), Target::LoginSubmit),
            (product.name_heading.selector().clone(), Target::ProductName),
            (product.price_label.selector().clone(), Target::ProductPrice),
            (product.add_to_cart_button.selector().clone(), Target::AddToCart),
            (product.back_home_link.selector().clone(), Target::BackHomeLink),
            (cart.table.selector().clone(), Target::CartTable),
            (cart.total.selector().clone(), Target::CartTotal),
            (cart.place_order_button.selector().clone(), Target::PlaceOrder),
            (checkout.order_modal.selector().clone(), Target::OrderModal),
            (checkout.name_input.selector().clone(), Target::Input("name")),
            (checkout.country_input.selector().clone(), Target::Input("country")),
            (checkout.city_input.selector().clone(), Target::Input("city")),
            (checkout.card_input.selector().clone(), Target::Input("card")),
            (checkout.month_input.selector().clone(), Target::Input("month")),
            (checkout.year_input.selector().clone(), Target::Input("year")),
            (checkout.purchase_button.selector().clone(), Target::Purchase),
            (checkout.confirmation_modal.selector().clone(), Target::Confirmation),
            (checkout.confirmation_heading.selector().clone(), Target::ConfirmationHeading),
            (checkout.confirmation_details.selector().clone(), Target::ConfirmationDetails),
            (checkout.confirmation_ok_button.selector().clone(), Target::ConfirmationOk),
        ];
        for category in Category::ALL {
            fixed.push((home.category(category).selector().clone(), Target::Category(category)));
        }

        let accounts = [
            ("autouser_20251005_1234", "Auto@12345"),
            ("autouser_20251005_5678", "Auto@67890"),
        ]
        .into_iter()
        .map(|(u, p)| (u.to_string(), p.to_string()))
        .collect();

        Self {
            base_url: MOCK_BASE_URL.to_string(),
            catalog: demoblaze_catalog(),
            render_delay: Duration::from_millis(500),
            removal_delay: Duration::from_millis(300),
            hide_removed: false,
            state: Mutex::new(SiteState {
                screen: Screen::Blank,
                url: "about:blank".to_string(),
                user: None,
                accounts,
                login_modal_open: false,
                order_modal_open: false,
                confirmation: None,
                inputs: HashMap::new(),
                cart: Vec::new(),
                orders: Vec::new(),
                next_entry_id: 1,
                next_order_id: 7_364_158,
                open_dialog: None,
                disabled: Vec::new(),
                intercepted: HashMap::new(),
                history: Vec::new(),
                mouse: Vec::new(),
            }),
            dialog_subscribers: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            fixed,
            home,
            cart,
        }
    }

    /// Serve from another origin
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Time between cart page load and its rows rendering
    #[must_use]
    pub const fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    /// Time between clicking Delete and the row leaving the DOM
    #[must_use]
    pub const fn with_removal_delay(mut self, delay: Duration) -> Self {
        self.removal_delay = delay;
        self
    }

    /// Hide deleted rows in place instead of removing them.
    ///
    /// The row's delete link stays attached but invisible until the cart
    /// page is loaded again.
    #[must_use]
    pub const fn with_hidden_removal(mut self) -> Self {
        self.hide_removed = true;
        self
    }

    /// Register an account
    #[must_use]
    pub fn with_account(self, username: &str, password: &str) -> Self {
        self.lock()
            .accounts
            .insert(username.to_string(), password.to_string());
        self
    }

    fn lock(&self) -> MutexGuard<'_, SiteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn product(&self, id: u32) -> Option<&CatalogItem> {
        self.catalog.iter().find(|p| p.id == id)
    }

    fn product_named(&self, name: &str) -> Option<&CatalogItem> {
        self.catalog.iter().find(|p| p.name == name)
    }

    // ------------------------------------------------------------------
    // Test hooks
    // ------------------------------------------------------------------

    /// Jump straight to the home page
    pub fn open_home(&self) {
        let mut st = self.lock();
        self.go_home(&mut st);
    }

    /// Put products in the server-side cart
    pub fn seed_cart(&self, names: &[&str]) -> E2eResult<()> {
        let mut st = self.lock();
        for name in names {
            let id = self
                .product_named(name)
                .map(|p| p.id)
                .ok_or_else(|| E2eError::driver(format!("unknown product '{name}'")))?;
            let entry_id = st.next_entry_id;
            st.next_entry_id += 1;
            st.cart.push(CartEntry::new(entry_id, id));
        }
        Ok(())
    }

    /// Keep `locator` disabled for `duration` from now
    pub fn disable_for(&self, locator: &Locator, duration: Duration) {
        let until = Instant::now() + duration;
        self.lock().disabled.push((locator.clone(), until));
    }

    /// Make the next `times` clicks on `locator` fail as intercepted
    pub fn intercept_clicks(&self, locator: &Locator, times: u32) {
        self.lock().intercepted.insert(locator.clone(), times);
    }

    /// Close the page
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Names in the server-side cart, oldest first
    #[must_use]
    pub fn cart_product_names(&self) -> Vec<String> {
        let now = Instant::now();
        let st = self.lock();
        st.cart
            .iter()
            .filter(|e| e.in_cart_at(now))
            .filter_map(|e| self.product(e.product_id).map(|p| p.name.clone()))
            .collect()
    }

    /// Logged-in username
    #[must_use]
    pub fn logged_in_user(&self) -> Option<String> {
        self.lock().user.clone()
    }

    /// Completed purchases
    #[must_use]
    pub fn orders(&self) -> Vec<PlacedOrder> {
        self.lock().orders.clone()
    }

    /// Catalog price of a product
    #[must_use]
    pub fn price_of(&self, name: &str) -> Option<u32> {
        self.product_named(name).map(|p| p.price)
    }

    /// Call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Check if a call with this prefix was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(prefix))
    }

    /// Raw mouse input received
    #[must_use]
    pub fn mouse_events(&self) -> Vec<MouseEvent> {
        self.lock().mouse.clone()
    }

    /// Whether a native dialog is waiting for an answer
    #[must_use]
    pub fn has_open_dialog(&self) -> bool {
        self.lock().open_dialog.is_some()
    }

    // ------------------------------------------------------------------
    // Page model
    // ------------------------------------------------------------------

    fn go_home(&self, st: &mut SiteState) {
        st.screen = Screen::Home { category: None };
        st.url = format!("{}/index.html", self.base_url);
        st.login_modal_open = false;
        st.order_modal_open = false;
    }

    fn go_cart(&self, st: &mut SiteState, now: Instant) {
        Self::purge_removed(st, now);
        st.screen = Screen::Cart { loaded_at: now };
        st.url = format!("{}/cart.html", self.base_url);
        st.login_modal_open = false;
        st.order_modal_open = false;
    }

    fn go_product(&self, st: &mut SiteState, id: u32) {
        st.screen = Screen::Product(id);
        st.url = format!("{}/prod.html?idp_={id}", self.base_url);
        st.login_modal_open = false;
    }

    fn purge_removed(st: &mut SiteState, now: Instant) {
        st.cart.retain(|e| e.in_cart_at(now));
    }

    /// Rows currently in the cart table, with their visibility
    fn rendered_rows<'a>(&'a self, st: &'a SiteState, now: Instant) -> Vec<(u64, &'a CatalogItem, bool)> {
        let Screen::Cart { loaded_at } = st.screen else {
            return Vec::new();
        };
        if now < loaded_at + self.render_delay {
            return Vec::new();
        }
        st.cart
            .iter()
            .filter(|e| e.present_at(now))
            .filter_map(|e| {
                self.product(e.product_id)
                    .map(|p| (e.entry_id, p, e.shown_at(now)))
            })
            .collect()
    }

    fn cart_total(&self, st: &SiteState, now: Instant) -> u32 {
        st.cart
            .iter()
            .filter(|e| e.in_cart_at(now))
            .filter_map(|e| self.product(e.product_id))
            .map(|p| p.price)
            .sum()
    }

    fn input_value(st: &SiteState, name: &'static str) -> String {
        st.inputs.get(name).cloned().unwrap_or_default()
    }

    fn fixed_node(&self, st: &SiteState, now: Instant, target: Target) -> Option<Node> {
        let on_page = !matches!(st.screen, Screen::Blank);
        let node = match target {
            Target::HomeLink if on_page => Node::new(target, "Home (current)", true),
            Target::BackHomeLink if on_page => Node::new(target, "Home ", true),
            Target::CartLink if on_page => Node::new(target, "Cart", true),
            Target::LoginLink if on_page => Node::new(target, "Log in", st.user.is_none()),
            Target::LogoutLink if on_page => Node::new(target, "Log out", st.user.is_some()),
            Target::WelcomeText if on_page => {
                let text = st.user.as_ref().map(|u| format!("Welcome {u}")).unwrap_or_default();
                Node::new(target, text, st.user.is_some())
            }
            Target::LoginModal if on_page => Node::new(target, "", st.login_modal_open),
            Target::Input(name @ ("loginusername" | "loginpassword")) if on_page => {
                Node::input(name, &Self::input_value(st, name), st.login_modal_open)
            }
            Target::LoginSubmit if on_page => Node::new(target, "Log in", st.login_modal_open),
            Target::Category(category) => match st.screen {
                Screen::Home { .. } => Node::new(target, category.to_string(), true),
                _ => return None,
            },
            Target::ProductName | Target::ProductPrice | Target::AddToCart => {
                let Screen::Product(id) = st.screen else {
                    return None;
                };
                let product = self.product(id)?;
                let text = match target {
                    Target::ProductName => product.name.clone(),
                    Target::ProductPrice => format!("${} *includes tax", product.price),
                    _ => "Add to cart".to_string(),
                };
                Node::new(target, text, true)
            }
            Target::CartTable | Target::CartTotal | Target::PlaceOrder | Target::OrderModal => {
                if !matches!(st.screen, Screen::Cart { .. }) {
                    return None;
                }
                match target {
                    Target::CartTotal => {
                        let shown: Vec<u32> = self
                            .rendered_rows(st, now)
                            .into_iter()
                            .filter(|(_, _, shown)| *shown)
                            .map(|(_, p, _)| p.price)
                            .collect();
                        let text = if shown.is_empty() {
                            String::new()
                        } else {
                            shown.iter().sum::<u32>().to_string()
                        };
                        Node::new(target, text, true)
                    }
                    Target::PlaceOrder => Node::new(target, "Place Order", true),
                    Target::OrderModal => Node::new(target, "", st.order_modal_open),
                    _ => Node::new(target, "", true),
                }
            }
            Target::Input(name) => {
                if !matches!(st.screen, Screen::Cart { .. }) {
                    return None;
                }
                Node::input(name, &Self::input_value(st, name), st.order_modal_open)
            }
            Target::Purchase => {
                if !matches!(st.screen, Screen::Cart { .. }) {
                    return None;
                }
                Node::new(target, "Purchase", st.order_modal_open)
            }
            Target::Confirmation
            | Target::ConfirmationHeading
            | Target::ConfirmationDetails
            | Target::ConfirmationOk => {
                let order = st.confirmation.as_ref()?;
                let text = match target {
                    Target::ConfirmationHeading => "Thank you for your purchase!".to_string(),
                    Target::ConfirmationDetails => confirmation_details(order),
                    Target::ConfirmationOk => "OK".to_string(),
                    _ => format!("Thank you for your purchase!{}", confirmation_details(order)),
                };
                Node::new(target, text, true)
            }
            _ => return None,
        };
        Some(node)
    }

    /// Every element a selector matches, in document order
    fn query(&self, st: &SiteState, now: Instant, selector: &Selector) -> Vec<Node> {
        if let Some((_, target)) = self.fixed.iter().find(|(s, _)| s == selector) {
            return self.fixed_node(st, now, *target).into_iter().collect();
        }

        if selector == self.home.product_cards.selector() {
            return self.product_cards(st);
        }
        for product in &self.catalog {
            if selector == self.home.product_link(&product.name).selector() {
                return self
                    .product_cards(st)
                    .into_iter()
                    .filter(|n| n.target == Target::ProductCard(product.id))
                    .collect();
            }
        }

        let rows = self.rendered_rows(st, now);
        if selector == self.cart.item_rows.selector() {
            return rows
                .iter()
                .map(|(entry, p, shown)| {
                    Node::new(Target::CartRow(*entry), format!("{}{}Delete", p.name, p.price), *shown)
                })
                .collect();
        }
        if selector == self.cart.delete_links.selector() {
            return rows
                .iter()
                .map(|(entry, _, shown)| Node::new(Target::Delete(*entry), "Delete", *shown))
                .collect();
        }
        for (i, (entry, product, shown)) in rows.iter().enumerate() {
            if selector == self.cart.item_name(i).selector() {
                return vec![Node::new(Target::CartCell(*entry), product.name.clone(), *shown)];
            }
            if selector == self.cart.item_price(i).selector() {
                return vec![Node::new(Target::CartCell(*entry), product.price.to_string(), *shown)];
            }
        }
        for product in &self.catalog {
            if selector == self.cart.delete_button(&product.name).selector() {
                return rows
                    .iter()
                    .filter(|(_, p, _)| p.name.contains(&product.name))
                    .map(|(entry, _, shown)| Node::new(Target::Delete(*entry), "Delete", *shown))
                    .collect();
            }
        }
        self.text_matches(st, now, selector)
    }

    /// Non-input elements a [`by_text`] locator reaches
    fn text_matches(&self, st: &SiteState, now: Instant, selector: &Selector) -> Vec<Node> {
        let mut nodes: Vec<Node> = self
            .fixed
            .iter()
            .filter_map(|(_, target)| self.fixed_node(st, now, *target))
            .collect();
        nodes.extend(self.product_cards(st));
        nodes
            .into_iter()
            .filter(|node| !node.editable && by_text(&node.text).selector() == selector)
            .collect()
    }

    fn product_cards(&self, st: &SiteState) -> Vec<Node> {
        let Screen::Home { category } = st.screen else {
            return Vec::new();
        };
        self.catalog
            .iter()
            .filter(|p| category.map_or(true, |c| c == p.category))
            .map(|p| Node::new(Target::ProductCard(p.id), p.name.clone(), true))
            .collect()
    }

    fn resolve(&self, st: &SiteState, now: Instant, locator: &Locator) -> Option<Node> {
        let nodes = self.query(st, now, locator.selector());
        nodes.into_iter().nth(locator.index().unwrap_or(0))
    }

    fn is_disabled(st: &SiteState, now: Instant, locator: &Locator) -> bool {
        st.disabled
            .iter()
            .any(|(loc, until)| loc == locator && now < *until)
    }

    fn require(&self, st: &SiteState, now: Instant, locator: &Locator) -> E2eResult<Node> {
        self.resolve(st, now, locator)
            .ok_or_else(|| E2eError::driver(format!("no element matches {locator}")))
    }

    fn require_actionable(&self, st: &SiteState, now: Instant, locator: &Locator) -> E2eResult<Node> {
        let node = self.require(st, now, locator)?;
        if !node.visible {
            return Err(E2eError::driver(format!("{locator} is not visible")));
        }
        if Self::is_disabled(st, now, locator) {
            return Err(E2eError::driver(format!("{locator} is disabled")));
        }
        Ok(node)
    }

    fn open_dialog(&self, st: &mut SiteState, dialog: Dialog) {
        st.history.push(format!("dialog:{}", dialog.message()));
        let mut subscribers = self
            .dialog_subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| !tx.is_closed());
        if subscribers.is_empty() {
            st.history.push("dialog-auto-dismissed".to_string());
            return;
        }
        for tx in subscribers.iter() {
            let _ = tx.send(dialog.clone());
        }
        st.open_dialog = Some(dialog);
    }

    fn activate(&self, st: &mut SiteState, now: Instant, target: Target) {
        match target {
            Target::HomeLink | Target::BackHomeLink => self.go_home(st),
            Target::CartLink => self.go_cart(st, now),
            Target::LoginLink => st.login_modal_open = true,
            Target::LogoutLink => {
                st.user = None;
                self.go_home(st);
            }
            Target::LoginSubmit => self.submit_login(st),
            Target::Category(category) => {
                if let Screen::Home { .. } = st.screen {
                    st.screen = Screen::Home {
                        category: Some(category),
                    };
                }
            }
            Target::ProductCard(id) => self.go_product(st, id),
            Target::AddToCart => {
                if let Screen::Product(id) = st.screen {
                    let entry_id = st.next_entry_id;
                    st.next_entry_id += 1;
                    st.cart.push(CartEntry::new(entry_id, id));
                    self.open_dialog(st, Dialog::alert(PRODUCT_ADDED));
                }
            }
            Target::Delete(entry_id) => {
                let due = now + self.removal_delay;
                if let Some(entry) = st.cart.iter_mut().find(|e| e.entry_id == entry_id) {
                    if self.hide_removed {
                        entry.hidden_at.get_or_insert(due);
                    } else {
                        entry.removed_at.get_or_insert(due);
                    }
                }
            }
            Target::PlaceOrder => st.order_modal_open = true,
            Target::Purchase => self.purchase(st, now),
            Target::ConfirmationOk => {
                st.confirmation = None;
                self.go_home(st);
            }
            _ => {}
        }
    }

    fn submit_login(&self, st: &mut SiteState) {
        let username = Self::input_value(st, "loginusername");
        let password = Self::input_value(st, "loginpassword");
        let message = if username.is_empty() || password.is_empty() {
            Some("Please fill out Username and Password.")
        } else {
            match st.accounts.get(&username) {
                None => Some("User does not exist."),
                Some(expected) if *expected != password => Some("Wrong password."),
                Some(_) => None,
            }
        };
        match message {
            Some(message) => self.open_dialog(st, Dialog::alert(message)),
            None => {
                st.user = Some(username);
                st.login_modal_open = false;
            }
        }
    }

    fn purchase(&self, st: &mut SiteState, now: Instant) {
        let name = Self::input_value(st, "name");
        let card = Self::input_value(st, "card");
        if name.is_empty() || card.is_empty() {
            self.open_dialog(st, Dialog::alert("Please fill out Name and Creditcard."));
            return;
        }
        Self::purge_removed(st, now);
        let order = PlacedOrder {
            id: st.next_order_id,
            amount: self.cart_total(st, now),
            name,
            card,
        };
        st.next_order_id += 1;
        st.cart.clear();
        st.order_modal_open = false;
        st.orders.push(order.clone());
        st.confirmation = Some(order);
    }

    fn bounding_box_for(locator: &Locator) -> BoundingBox {
        let seed = locator
            .selector()
            .expression()
            .bytes()
            .fold(0_u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        let row = f64::from(seed % 20) + locator.index().map_or(0.0, |i| i as f64);
        BoundingBox::new(40.0, 30.0 * row, 120.0, 24.0)
    }
}

fn confirmation_details(order: &PlacedOrder) -> String {
    let date = chrono::Utc::now().format("%-d/%-m/%Y");
    format!(
        "Id: {}\nAmount: {} USD\nCard Number: {}\nName: {}\nDate: {date}",
        order.id, order.amount, order.card, order.name
    )
}

#[async_trait]
impl BrowserDriver for MockStorefront {
    async fn navigate(
        &self,
        url: &str,
        wait_until: LoadState,
        _timeout: Duration,
    ) -> E2eResult<NavigationResponse> {
        let now = Instant::now();
        let mut st = self.lock();
        st.history.push(format!("navigate:{url}:{wait_until}"));
        let path = url.strip_prefix(self.base_url.as_str()).unwrap_or(url);
        let status = match path {
            "" | "/" | "/index.html" => {
                self.go_home(&mut st);
                200
            }
            "/cart.html" => {
                self.go_cart(&mut st, now);
                200
            }
            _ => match path
                .strip_prefix("/prod.html?idp_=")
                .and_then(|id| id.parse::<u32>().ok())
                .filter(|id| self.product(*id).is_some())
            {
                Some(id) => {
                    self.go_product(&mut st, id);
                    200
                }
                None => {
                    st.screen = Screen::Blank;
                    404
                }
            },
        };
        st.url = url.to_string();
        Ok(NavigationResponse {
            url: url.to_string(),
            status: Some(status),
        })
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn reload(&self, wait_until: LoadState) -> E2eResult<()> {
        let now = Instant::now();
        let mut st = self.lock();
        st.history.push(format!("reload:{wait_until}"));
        Self::purge_removed(&mut st, now);
        st.login_modal_open = false;
        st.order_modal_open = false;
        if let Screen::Cart { .. } = st.screen {
            st.screen = Screen::Cart { loaded_at: now };
        }
        Ok(())
    }

    async fn probe(&self, locator: &Locator) -> E2eResult<ElementProbe> {
        let now = Instant::now();
        let st = self.lock();
        Ok(match self.resolve(&st, now, locator) {
            None => ElementProbe::detached(),
            Some(node) => {
                let enabled = !Self::is_disabled(&st, now, locator);
                ElementProbe {
                    attached: true,
                    visible: node.visible,
                    enabled,
                    editable: node.editable && enabled,
                }
            }
        })
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let now = Instant::now();
        let st = self.lock();
        let total = self.query(&st, now, locator.selector()).len();
        Ok(match locator.index() {
            None => total,
            Some(i) => usize::from(total > i),
        })
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        let now = Instant::now();
        let st = self.lock();
        Ok(self.resolve(&st, now, locator).map(|node| {
            if node.editable {
                String::new()
            } else {
                node.text
            }
        }))
    }

    async fn inner_text(&self, locator: &Locator) -> E2eResult<Option<String>> {
        let now = Instant::now();
        let st = self.lock();
        Ok(self.resolve(&st, now, locator).map(|node| {
            if node.editable || !node.visible {
                String::new()
            } else {
                node.text.trim().to_string()
            }
        }))
    }

    async fn input_value(&self, locator: &Locator) -> E2eResult<String> {
        let now = Instant::now();
        let st = self.lock();
        let node = self.require(&st, now, locator)?;
        if !node.editable {
            return Err(E2eError::driver(format!("{locator} is not an input")));
        }
        Ok(node.text)
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        let now = Instant::now();
        let st = self.lock();
        let Some(node) = self.resolve(&st, now, locator) else {
            return Ok(None);
        };
        Ok(match name {
            "disabled" if Self::is_disabled(&st, now, locator) => Some("disabled".to_string()),
            "value" if node.editable => Some(node.text),
            _ => None,
        })
    }

    async fn bounding_box(&self, locator: &Locator) -> E2eResult<Option<BoundingBox>> {
        let now = Instant::now();
        let st = self.lock();
        Ok(self
            .resolve(&st, now, locator)
            .filter(|node| node.visible)
            .map(|_| Self::bounding_box_for(locator)))
    }

    async fn click(&self, locator: &Locator, options: ClickOptions) -> E2eResult<()> {
        let now = Instant::now();
        let mut st = self.lock();
        st.history.push(format!("click:{}:{}", locator.description(), options.click_count));
        if let Some(remaining) = st.intercepted.get_mut(locator) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(E2eError::driver(format!(
                    "{locator}: element click intercepted by another element"
                )));
            }
        }
        let node = self.require_actionable(&st, now, locator)?;
        self.activate(&mut st, now, node.target);
        Ok(())
    }

    async fn hover(&self, locator: &Locator) -> E2eResult<()> {
        let now = Instant::now();
        let mut st = self.lock();
        st.history.push(format!("hover:{}", locator.description()));
        self.require_actionable(&st, now, locator).map(|_| ())
    }

    async fn fill(&self, locator: &Locator, value: &str, force: bool) -> E2eResult<()> {
        let now = Instant::now();
        let mut st = self.lock();
        st.history.push(format!("fill:{}:{value}", locator.description()));
        let node = if force {
            self.require(&st, now, locator)?
        } else {
            self.require_actionable(&st, now, locator)?
        };
        let Target::Input(name) = node.target else {
            return Err(E2eError::driver(format!("{locator} is not an input")));
        };
        st.inputs.insert(name, value.to_string());
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> E2eResult<()> {
        let now = Instant::now();
        let mut st = self.lock();
        st.history.push(format!("clear:{}", locator.description()));
        let node = self.require_actionable(&st, now, locator)?;
        let Target::Input(name) = node.target else {
            return Err(E2eError::driver(format!("{locator} is not an input")));
        };
        st.inputs.remove(name);
        Ok(())
    }

    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()> {
        let now = Instant::now();
        let mut st = self.lock();
        st.history.push(format!("press:{}:{key}", locator.description()));
        let node = self.require_actionable(&st, now, locator)?;
        if key == "Enter" && node.target == Target::Input("loginpassword") {
            self.submit_login(&mut st);
        }
        Ok(())
    }

    async fn set_checked(&self, locator: &Locator, checked: bool) -> E2eResult<()> {
        let now = Instant::now();
        let mut st = self.lock();
        st.history.push(format!("check:{}:{checked}", locator.description()));
        self.require_actionable(&st, now, locator)?;
        Err(E2eError::driver(format!("{locator} is not a checkbox or radio input")))
    }

    async fn scroll_into_view(&self, locator: &Locator) -> E2eResult<()> {
        let now = Instant::now();
        let mut st = self.lock();
        st.history.push(format!("scroll:{}", locator.description()));
        self.require(&st, now, locator).map(|_| ())
    }

    async fn mouse(&self, event: MouseEvent) -> E2eResult<()> {
        self.lock().mouse.push(event);
        Ok(())
    }

    async fn subscribe_dialogs(&self) -> E2eResult<DialogSubscription> {
        let (tx, rx) = dialog_channel();
        self.dialog_subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        Ok(rx)
    }

    async fn respond_to_dialog(&self, action: &DialogAction) -> E2eResult<()> {
        let mut st = self.lock();
        match st.open_dialog.take() {
            Some(dialog) => {
                st.history.push(format!(
                    "dialog-{}:{}",
                    if action.accepts() { "accepted" } else { "dismissed" },
                    dialog.message()
                ));
                Ok(())
            }
            None => Err(E2eError::Dialog {
                message: "no dialog is open".to_string(),
            }),
        }
    }

    async fn screenshot(&self, full_page: bool) -> E2eResult<Vec<u8>> {
        if self.is_closed() {
            return Err(E2eError::Screenshot {
                message: "page is closed".to_string(),
            });
        }
        self.lock().history.push(format!("screenshot:{full_page}"));
        Ok(FAKE_PNG.to_vec())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::{wait_for_state, WaitOptions, WaitState};

    const T: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_navigation_status() {
        let site = MockStorefront::new();
        let ok = site.navigate(MOCK_BASE_URL, LoadState::Load, T).await.unwrap();
        assert!(ok.is_ok());
        let missing = site
            .navigate("https://www.demoblaze.com/nope.html", LoadState::Load, T)
            .await
            .unwrap();
        assert_eq!(missing.status, Some(404));
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_flow_and_wrong_password_alert() {
        let site = MockStorefront::new();
        site.open_home();
        let login = LoginLocators::new();
        let mut dialogs = site.subscribe_dialogs().await.unwrap();

        site.click(&login.login_link, ClickOptions::default()).await.unwrap();
        site.fill(&login.username_input, "autouser_20251005_1234", true).await.unwrap();
        site.fill(&login.password_input, "bad", true).await.unwrap();
        site.click(&login.submit_button, ClickOptions::default()).await.unwrap();
        let alert = dialogs.next(T).await.unwrap();
        assert_eq!(alert.message(), "Wrong password.");
        site.respond_to_dialog(&DialogAction::Accept).await.unwrap();

        site.fill(&login.password_input, "Auto@12345", true).await.unwrap();
        site.click(&login.submit_button, ClickOptions::default()).await.unwrap();
        assert_eq!(site.logged_in_user().as_deref(), Some("autouser_20251005_1234"));
        let welcome = site.text_content(&login.welcome_text).await.unwrap();
        assert_eq!(welcome.as_deref(), Some("Welcome autouser_20251005_1234"));
        assert!(!site.probe(&login.login_link).await.unwrap().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cart_rows_render_after_delay() {
        let site = MockStorefront::new().with_render_delay(Duration::from_millis(800));
        site.seed_cart(&["Nexus 6", "MacBook Pro"]).unwrap();
        site.navigate("https://www.demoblaze.com/cart.html", LoadState::Load, T)
            .await
            .unwrap();
        let cart = CartLocators::new();
        assert_eq!(site.count(&cart.item_rows).await.unwrap(), 0);
        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(site.count(&cart.item_rows).await.unwrap(), 2);
        assert_eq!(
            site.text_content(&cart.item_price(1)).await.unwrap().as_deref(),
            Some("1100")
        );
        assert_eq!(
            site.text_content(&cart.total).await.unwrap().as_deref(),
            Some("1750")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleted_row_detaches_after_removal_delay() {
        let site = MockStorefront::new()
            .with_render_delay(Duration::ZERO)
            .with_removal_delay(Duration::from_millis(400));
        site.seed_cart(&["Nexus 6"]).unwrap();
        site.navigate("https://www.demoblaze.com/cart.html", LoadState::Load, T)
            .await
            .unwrap();
        let cart = CartLocators::new();
        let delete = cart.delete_button("Nexus 6");
        site.click(&delete, ClickOptions::default()).await.unwrap();
        assert!(site.probe(&delete).await.unwrap().attached);
        wait_for_state(&site, &delete, WaitState::Detached, &WaitOptions::new())
            .await
            .unwrap();
        assert!(site.cart_product_names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_to_cart_without_subscriber_auto_dismisses() {
        let site = MockStorefront::new();
        site.navigate("https://www.demoblaze.com/prod.html?idp_=3", LoadState::Load, T)
            .await
            .unwrap();
        let product = ProductLocators::new();
        site.click(&product.add_to_cart_button, ClickOptions::default())
            .await
            .unwrap();
        assert!(site.was_called("dialog-auto-dismissed"));
        assert!(!site.has_open_dialog());
        assert_eq!(site.cart_product_names(), vec!["Nexus 6".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_on_hidden_element_fails() {
        let site = MockStorefront::new();
        site.open_home();
        let login = LoginLocators::new();
        let err = site
            .click(&login.submit_button, ClickOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not visible"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_intercepted_clicks_then_success() {
        let site = MockStorefront::new();
        site.open_home();
        let login = LoginLocators::new();
        site.intercept_clicks(&login.login_link, 1);
        assert!(site.click(&login.login_link, ClickOptions::default()).await.is_err());
        site.click(&login.login_link, ClickOptions::default()).await.unwrap();
        assert!(site.probe(&login.modal).await.unwrap().visible);
    }
}
