//! Domain entities - the catalog product model and the search request/result shapes.

mod product;
mod request;

pub use product::{DerivedMetrics, Nutrition, PREVIEW_LEN, Product, ProductForm, ProductSummary};
pub use request::{
    DEFAULT_LIMIT, MAX_LIMIT, MAX_QUERY_LEN, SearchRequest, SearchResult, SortKey,
};
