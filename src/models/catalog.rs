use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static::lazy_static! {
    static ref ID_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct Product {
    #[validate(length(min = 1, max = 64, message = "Product id must be 1-64 characters"))]
    #[validate(regex(
        path = "ID_REGEX",
        message = "Product id can only contain letters, numbers, dashes and underscores"
    ))]
    pub id: String,

    #[validate(length(min = 1, max = 100, message = "Product name must be 1-100 characters"))]
    pub name: String,

    pub price: f64,

    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct DiningTable {
    #[validate(length(min = 1, max = 64, message = "Table id must be 1-64 characters"))]
    #[validate(regex(
        path = "ID_REGEX",
        message = "Table id can only contain letters, numbers, dashes and underscores"
    ))]
    pub id: String,

    #[validate(length(min = 1, max = 50, message = "Table name must be 1-50 characters"))]
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
    #[error("Product {id} has an invalid price: {price}")]
    InvalidPrice { id: String, price: f64 },
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(String),
    #[error("Duplicate table id: {0}")]
    DuplicateTable(String),
    #[error("Product {product} refers to unknown category {category}")]
    UnknownCategory { product: String, category: String },
}

/// Menu data the order views are built from: products with unit prices,
/// the categories they are grouped in and the tables that can order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tables: Vec<DiningTable>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Catalog {
    pub fn new(
        categories: Vec<String>,
        tables: Vec<DiningTable>,
        products: Vec<Product>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            categories,
            tables,
            products,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        tracing::debug!("Loading catalog from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&contents)?;
        tracing::info!(
            "Catalog loaded: {} products, {} tables",
            catalog.products.len(),
            catalog.tables.len()
        );
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut product_ids = HashSet::new();
        for product in &self.products {
            product.validate()?;

            if !product.price.is_finite() || product.price < 0.0 {
                return Err(CatalogError::InvalidPrice {
                    id: product.id.clone(),
                    price: product.price,
                });
            }

            if !product_ids.insert(product.id.as_str()) {
                return Err(CatalogError::DuplicateProduct(product.id.clone()));
            }

            if let Some(category) = &product.category {
                if !self.categories.is_empty() && !self.categories.contains(category) {
                    return Err(CatalogError::UnknownCategory {
                        product: product.id.clone(),
                        category: category.clone(),
                    });
                }
            }
        }

        let mut table_ids = HashSet::new();
        for table in &self.tables {
            table.validate()?;
            if !table_ids.insert(table.id.as_str()) {
                return Err(CatalogError::DuplicateTable(table.id.clone()));
            }
        }

        Ok(())
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Unit price for a product id, `None` when the catalog has no such product.
    pub fn price_of(&self, id: &str) -> Option<f64> {
        self.product(id).map(|p| p.price)
    }

    pub fn table(&self, id: &str) -> Option<&DiningTable> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn products_in<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a Product> + 'a {
        self.products
            .iter()
            .filter(move |p| p.category.as_deref() == Some(category))
    }
}
