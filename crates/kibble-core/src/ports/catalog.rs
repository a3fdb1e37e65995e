//! Upstream product catalog port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Product, ProductForm};

/// Query forwarded to the catalog. Only these filters are supported upstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub form: Option<ProductForm>,
    pub conditions: Vec<String>,
    pub min_protein: Option<f64>,
    pub max_carbs: Option<f64>,
    pub limit: usize,
    pub offset: usize,
}

/// Pagination metadata reported by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    #[serde(default)]
    pub has_more: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub items: Vec<Product>,
    pub meta: PageMeta,
}

impl CatalogPage {
    pub fn empty(limit: usize, offset: usize) -> Self {
        Self {
            items: Vec::new(),
            meta: PageMeta {
                total: 0,
                limit,
                offset,
                has_more: Some(false),
            },
        }
    }
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch one page of products matching the query.
    async fn fetch_batch(&self, query: &CatalogQuery) -> Result<CatalogPage, CatalogError>;

    /// Fetch a single product with its full ingredient list.
    async fn fetch_product(&self, id: &str) -> Result<Product, CatalogError>;
}

/// Catalog failures. Only `Unavailable` is worth retrying.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid catalog response: {0}")]
    Invalid(String),
}

impl CatalogError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CatalogError::Unavailable(_))
    }
}
