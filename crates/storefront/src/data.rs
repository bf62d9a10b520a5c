//! JSON fixture loading.
//!
//! Fixtures live in `data/<env>/`: `users.json`, `products.json` and
//! `checkout-data.json`. Files are read on every call, so edits are picked up
//! without restarting a run.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult};

/// Storefront account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name
    pub username: String,
    /// Password
    pub password: String,
}

/// Product categories in the home-page sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Phones
    Phones,
    /// Laptops
    Laptops,
    /// Monitors
    Monitors,
}

impl Category {
    /// All categories in sidebar order
    pub const ALL: [Self; 3] = [Self::Phones, Self::Laptops, Self::Monitors];

    /// Key the storefront passes to `byCat(...)`
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Phones => "phone",
            Self::Laptops => "notebook",
            Self::Monitors => "monitor",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phones => write!(f, "Phones"),
            Self::Laptops => write!(f, "Laptops"),
            Self::Monitors => write!(f, "Monitors"),
        }
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Display name
    pub name: String,
    /// Sidebar category
    pub category: Category,
    /// Known price, read from the page when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Place-order form values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutFormData {
    /// Buyer name
    pub name: String,
    /// Country
    pub country: String,
    /// City
    pub city: String,
    /// Card number
    #[serde(rename = "creditCard")]
    pub credit_card: String,
    /// Card expiry month
    pub month: String,
    /// Card expiry year
    pub year: String,
}

/// Reads fixture files for one environment
#[derive(Debug, Clone)]
pub struct TestDataLoader {
    dir: PathBuf,
}

impl TestDataLoader {
    /// Loader over an explicit fixture directory
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Loader for the configured environment (`data/<test_env>`)
    #[must_use]
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self::new(config.fixture_dir())
    }

    /// Fixture directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> E2eResult<Vec<T>> {
        let path = self.dir.join(file);
        tracing::debug!(path = %path.display(), "loading fixture");
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// All users
    pub fn load_users(&self) -> E2eResult<Vec<User>> {
        self.read("users.json")
    }

    /// All products
    pub fn load_products(&self) -> E2eResult<Vec<Product>> {
        self.read("products.json")
    }

    /// All checkout records
    pub fn load_checkout_data(&self) -> E2eResult<Vec<CheckoutFormData>> {
        self.read("checkout-data.json")
    }

    /// User at `index`
    pub fn get_user(&self, index: usize) -> E2eResult<User> {
        pick(self.load_users()?, index, "user")
    }

    /// Checkout record at `index`
    pub fn get_checkout_data(&self, index: usize) -> E2eResult<CheckoutFormData> {
        pick(self.load_checkout_data()?, index, "checkout")
    }

    /// Product with exactly this name
    pub fn get_product_by_name(&self, name: &str) -> E2eResult<Option<Product>> {
        Ok(self.load_products()?.into_iter().find(|p| p.name == name))
    }

    /// Product with exactly this name, failing when absent
    pub fn require_product(&self, name: &str) -> E2eResult<Product> {
        self.get_product_by_name(name)?
            .ok_or_else(|| E2eError::FixtureMissing {
                kind: "product",
                name: name.to_string(),
            })
    }

    /// Products in a category, file order kept
    pub fn get_products_by_category(&self, category: Category) -> E2eResult<Vec<Product>> {
        Ok(self
            .load_products()?
            .into_iter()
            .filter(|p| p.category == category)
            .collect())
    }
}

fn pick<T>(mut records: Vec<T>, index: usize, kind: &'static str) -> E2eResult<T> {
    if index >= records.len() {
        return Err(E2eError::FixtureIndex {
            kind,
            index,
            available: records.len(),
        });
    }
    Ok(records.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixtures(dir: &Path) {
        fs::write(
            dir.join("users.json"),
            r#"[{"username": "autouser_20251005_1234", "password": "s3cret"}]"#,
        )
        .unwrap();
        fs::write(
            dir.join("products.json"),
            r#"[
                {"name": "Samsung galaxy s6", "category": "Phones"},
                {"name": "Nokia lumia 1520", "category": "Phones", "price": 820},
                {"name": "MacBook Pro", "category": "Laptops"}
            ]"#,
        )
        .unwrap();
        fs::write(
            dir.join("checkout-data.json"),
            r#"[{"name": "Jane Doe", "country": "Vietnam", "city": "Hanoi",
                 "creditCard": "4111111111111111", "month": "12", "year": "2027"}]"#,
        )
        .unwrap();
    }

    mod loader_tests {
        use super::*;

        #[test]
        fn test_get_user_and_checkout() {
            let dir = tempfile::tempdir().unwrap();
            write_fixtures(dir.path());
            let loader = TestDataLoader::new(dir.path());
            assert_eq!(loader.get_user(0).unwrap().username, "autouser_20251005_1234");
            assert_eq!(loader.get_checkout_data(0).unwrap().credit_card, "4111111111111111");
        }

        #[test]
        fn test_out_of_bounds_is_hard_error() {
            let dir = tempfile::tempdir().unwrap();
            write_fixtures(dir.path());
            let loader = TestDataLoader::new(dir.path());
            let err = loader.get_user(1).unwrap_err();
            assert!(matches!(
                err,
                E2eError::FixtureIndex {
                    kind: "user",
                    index: 1,
                    available: 1
                }
            ));
            assert!(loader.get_checkout_data(5).unwrap_err().is_configuration());
        }

        #[test]
        fn test_products_by_name_and_category() {
            let dir = tempfile::tempdir().unwrap();
            write_fixtures(dir.path());
            let loader = TestDataLoader::new(dir.path());
            let nokia = loader.get_product_by_name("Nokia lumia 1520").unwrap().unwrap();
            assert_eq!(nokia.price, Some(820.0));
            assert!(loader.get_product_by_name("nokia lumia 1520").unwrap().is_none());
            let phones = loader.get_products_by_category(Category::Phones).unwrap();
            assert_eq!(phones.len(), 2);
            assert_eq!(phones[0].name, "Samsung galaxy s6");
            assert!(matches!(
                loader.require_product("Pixel"),
                Err(E2eError::FixtureMissing { kind: "product", .. })
            ));
        }

        #[test]
        fn test_missing_file_is_io_error() {
            let dir = tempfile::tempdir().unwrap();
            let loader = TestDataLoader::new(dir.path());
            assert!(matches!(loader.load_users(), Err(E2eError::Io(_))));
        }

        #[test]
        fn test_malformed_file_is_json_error() {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("users.json"), "{").unwrap();
            let loader = TestDataLoader::new(dir.path());
            assert!(matches!(loader.load_users(), Err(E2eError::Json(_))));
        }

        #[test]
        fn test_bundled_stg_fixtures_parse() {
            let loader = TestDataLoader::from_config(&SuiteConfig::default());
            assert!(!loader.load_users().unwrap().is_empty());
            assert!(!loader.load_checkout_data().unwrap().is_empty());
            loader.require_product("Samsung galaxy s6").unwrap();
            loader.require_product("MacBook Pro").unwrap();
        }
    }

    #[test]
    fn test_category_slugs() {
        assert_eq!(Category::Phones.slug(), "phone");
        assert_eq!(Category::Laptops.slug(), "notebook");
        assert_eq!(Category::Monitors.slug(), "monitor");
        assert_eq!(Category::Laptops.to_string(), "Laptops");
    }
}
