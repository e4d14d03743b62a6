//! Read-only product catalog.
//!
//! Loaded once at startup from a JSON array of products. The synchronizer
//! copies a product's attributes into a collection item when it is first
//! added; it never writes back.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use gemcase_core::{Product, ProductId};
use thiserror::Error;

/// Errors loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate product id in catalog: {0}")]
    DuplicateId(ProductId),
}

/// Products keyed by id, in file order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Arc<Vec<Product>>,
    index: Arc<HashMap<ProductId, usize>>,
}

impl Catalog {
    /// Load the catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a product array,
    /// or repeats a product id.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), products = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    /// Parse a catalog from a JSON product array.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or repeats a product id.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(raw)?;
        Self::from_products(products)
    }

    /// Build a catalog from products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two products share an id.
    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            if index.insert(product.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }
        Ok(Self {
            products: Arc::new(products),
            index: Arc::new(index),
        })
    }

    /// Look up a product.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.index.get(id).and_then(|&i| self.products.get(i))
    }

    /// All products.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("content/products.json");
        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 8);

        let ring = catalog.get(&ProductId::parse("1").unwrap()).unwrap();
        assert_eq!(ring.name, "Diamond Solitaire Ring");
        assert_eq!(ring.price.to_fixed(), "2500.00");
    }

    #[test]
    fn test_numeric_prices_and_missing_optional_fields() {
        let catalog = Catalog::from_json(
            r#"[{ "id": "9", "name": "Opal Ring", "price": 99.5, "image": "opal.jpg" }]"#,
        )
        .unwrap();
        let opal = catalog.get(&ProductId::parse("9").unwrap()).unwrap();
        assert_eq!(opal.price.to_fixed(), "99.50");
        assert_eq!(opal.color, "");
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let result = Catalog::from_json(
            r#"[
                { "id": "1", "name": "A", "price": "1", "image": "a" },
                { "id": "1", "name": "B", "price": "2", "image": "b" }
            ]"#,
        );
        assert!(matches!(result, Err(CatalogError::DuplicateId(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Catalog::load(Path::new("/nonexistent/products.json")),
            Err(CatalogError::Io { .. })
        ));
    }
}
