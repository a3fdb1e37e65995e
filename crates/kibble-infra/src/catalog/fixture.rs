//! In-process catalog over a fixed product list.
//!
//! Used for local development when no upstream catalog is configured,
//! and by the route tests.

use std::path::Path;

use async_trait::async_trait;

use kibble_core::domain::Product;
use kibble_core::ports::{Catalog, CatalogError, CatalogPage, CatalogQuery, PageMeta};

const SAMPLE_CATALOG: &str = include_str!("../../data/sample_catalog.json");

pub struct FixtureCatalog {
    products: Vec<Product>,
}

impl FixtureCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The bundled sample catalog.
    pub fn sample() -> Result<Self, CatalogError> {
        Self::parse(SAMPLE_CATALOG)
    }

    /// Load a JSON array of products from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Invalid(format!("{}: {e}", path.display())))?;
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> =
            serde_json::from_str(raw).map_err(|e| CatalogError::Invalid(e.to_string()))?;
        Ok(Self::new(products))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn matches(product: &Product, query: &CatalogQuery) -> bool {
        if let Some(search) = query.search.as_deref().map(str::to_lowercase) {
            let hit = product.name.to_lowercase().contains(&search)
                || product.brand.to_lowercase().contains(&search);
            if !hit {
                return false;
            }
        }

        if query.form.is_some() && product.form != query.form {
            return false;
        }

        if !query.conditions.is_empty() {
            let tagged = query.conditions.iter().any(|wanted| {
                product
                    .condition_tags
                    .iter()
                    .any(|tag| tag.eq_ignore_ascii_case(wanted.trim()))
            });
            if !tagged {
                return false;
            }
        }

        if let Some(min) = query.min_protein {
            if product.protein().is_none_or(|p| p < min) {
                return false;
            }
        }

        if let Some(max) = query.max_carbs {
            if product.carbs_estimated().is_none_or(|c| c > max) {
                return false;
            }
        }

        true
    }
}

#[async_trait]
impl Catalog for FixtureCatalog {
    async fn fetch_batch(&self, query: &CatalogQuery) -> Result<CatalogPage, CatalogError> {
        let matching: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| Self::matches(p, query))
            .collect();

        let total = matching.len();
        let items: Vec<Product> = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();

        Ok(CatalogPage {
            meta: PageMeta {
                total,
                limit: query.limit,
                offset: query.offset,
                has_more: Some(query.offset + items.len() < total),
            },
            items,
        })
    }

    async fn fetch_product(&self, id: &str) -> Result<Product, CatalogError> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("product {id}")))
    }
}
