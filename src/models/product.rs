use serde::{Deserialize, Serialize};

use crate::models::generate_id;
use crate::utils::error::{AppError, Result};

/// One catalog item with the price we currently charge for it.
/// Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Whole currency units, always positive.
    pub own_price: u32,
}

/// Raw catalog entry as it appears in the input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub own_price: u32,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: Vec<CatalogEntry>,
}

/// The product catalog for one run. Insertion order is preserved and
/// drives the order of rows in the result set.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Result<Self> {
        for product in &products {
            if product.own_price == 0 {
                return Err(AppError::Catalog(format!(
                    "product '{}' has a zero price",
                    product.name
                )));
            }
        }
        Ok(Self { products })
    }

    /// Parse a TOML catalog of `[[products]]` entries, rejecting empty
    /// names and non-positive prices.
    pub fn from_toml(input: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(input)?;

        let mut products = Vec::with_capacity(file.products.len());
        for entry in file.products {
            if entry.name.trim().is_empty() {
                return Err(AppError::Catalog("product with an empty name".to_string()));
            }
            if entry.own_price == 0 {
                return Err(AppError::Catalog(format!(
                    "product '{}' has a zero price",
                    entry.name
                )));
            }
            products.push(Product {
                id: entry.id.unwrap_or_else(generate_id),
                name: entry.name,
                own_price: entry.own_price,
            });
        }

        Ok(Self { products })
    }

    /// Keep only products whose name contains one of the given brand
    /// names, case-insensitively. An empty allow-list keeps everything.
    pub fn filter_by_brands(&self, brands: &[String]) -> Catalog {
        if brands.is_empty() {
            return self.clone();
        }

        let needles: Vec<String> = brands.iter().map(|b| b.to_lowercase()).collect();
        let products = self
            .products
            .iter()
            .filter(|p| {
                let name = p.name.to_lowercase();
                needles.iter().any(|needle| name.contains(needle))
            })
            .cloned()
            .collect();

        Catalog { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
