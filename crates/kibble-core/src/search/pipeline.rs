//! Search orchestration.
//!
//! The catalog only understands free text, form, conditions and two
//! nutrient bounds. Ingredient filters and sorting are applied here, over a
//! larger batch fetched from offset zero, and the result is re-paginated so
//! the caller sees one cursor contract either way.

use std::sync::Arc;

use crate::domain::{ProductSummary, SearchRequest, SearchResult};
use crate::error::SearchError;
use crate::ports::{Catalog, CatalogError, CatalogPage, CatalogQuery};

use super::matcher::{FilterTerm, PatternCache, Searchable};
use super::sort::sort_products;
use super::suggest::suggest;

/// Smallest batch requested when filtering or sorting locally.
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Hard ceiling on items requested from the catalog in one call.
pub const MAX_BATCH_SIZE: usize = 200;

const PREVIEW_SCOPE_NOTE: &str = "Ingredient filters only check product name, brand, condition tags \
     and the first 5 listed ingredients.";

const NO_INGREDIENT_DATA: &str = "Ingredient filtering is not available: this catalog does not \
     publish ingredient lists. Remove includeIngredients/excludeIngredients and try again.";

/// Number of catalog items to fetch for client-side processing.
pub fn batch_size(limit: usize) -> usize {
    limit
        .saturating_mul(2)
        .max(DEFAULT_BATCH_SIZE)
        .min(MAX_BATCH_SIZE)
}

pub struct SearchPipeline {
    catalog: Arc<dyn Catalog>,
    patterns: Arc<PatternCache>,
}

impl SearchPipeline {
    pub fn new(catalog: Arc<dyn Catalog>, patterns: Arc<PatternCache>) -> Self {
        Self { catalog, patterns }
    }

    /// Parse comma-separated include/exclude input using the shared pattern cache.
    pub fn parse_terms(&self, input: Option<&str>) -> Vec<FilterTerm> {
        input
            .map(|raw| FilterTerm::parse_list(raw, &self.patterns))
            .unwrap_or_default()
    }

    pub async fn execute(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        request.validate()?;

        if request.needs_client_side_processing() {
            self.client_processed(request).await
        } else {
            self.pass_through(request).await
        }
    }

    /// Upstream does the paging; results are relayed as-is.
    async fn pass_through(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        let query = catalog_query(request, request.limit, request.cursor);
        let page = self.fetch(&query).await?;

        let items: Vec<ProductSummary> = page
            .items
            .iter()
            .take(request.limit)
            .map(ProductSummary::from)
            .collect();

        let total = page.meta.total;
        let window_end = request.cursor.saturating_add(request.limit);
        let has_more = page.meta.has_more.unwrap_or(total > window_end);
        let cursor = if has_more {
            request.cursor + items.len()
        } else {
            request.cursor
        };

        tracing::debug!(total, returned = items.len(), has_more, "Pass-through search");

        Ok(SearchResult {
            items,
            total,
            has_more,
            cursor,
            filter_note: None,
            suggestions: None,
        })
    }

    async fn client_processed(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        let batch = batch_size(request.limit);
        let query = catalog_query(request, batch, 0);
        let page = self.fetch(&query).await?;
        let upstream_total = page.meta.total;

        let candidates: Vec<Searchable> = page.items.into_iter().map(Searchable::new).collect();

        if request.has_ingredient_filters()
            && !candidates.is_empty()
            && !candidates.iter().any(|c| c.product.has_ingredient_data())
        {
            tracing::info!(batch = candidates.len(), "Ingredient filter requested without ingredient data");
            return Err(SearchError::CapabilityMismatch(NO_INGREDIENT_DATA.to_string()));
        }

        let mut matched: Vec<&Searchable> = candidates
            .iter()
            .filter(|c| c.passes(&request.include_terms, &request.exclude_terms))
            .collect();

        if let Some(key) = &request.sort_by {
            sort_products(&mut matched, key);
        }

        let total = matched.len();
        let window_end = request.cursor.saturating_add(request.limit);
        let items: Vec<ProductSummary> = matched
            .iter()
            .skip(request.cursor)
            .take(request.limit)
            .map(|c| ProductSummary::from(&c.product))
            .collect();
        let has_more = window_end < total;
        let cursor = request.cursor + items.len();

        let suggestions = if total == 0 {
            suggest(&candidates, &request.include_terms, &request.exclude_terms)
        } else {
            None
        };

        let mut notes = Vec::new();
        if request.has_ingredient_filters() {
            notes.push(PREVIEW_SCOPE_NOTE.to_string());
        }
        let degraded: Vec<&str> = request
            .include_terms
            .iter()
            .chain(&request.exclude_terms)
            .filter(|term| term.is_degraded())
            .map(|term| term.normalized_value.as_str())
            .collect();
        if !degraded.is_empty() {
            notes.push(format!(
                "Quoted terms with special characters were matched as substrings: {}.",
                degraded.join(", ")
            ));
        }
        if upstream_total > candidates.len() {
            notes.push(format!(
                "Filtering and sorting covered the first {} of {} catalog matches.",
                candidates.len(),
                upstream_total
            ));
        }
        let filter_note = (!notes.is_empty()).then(|| notes.join(" "));

        tracing::debug!(
            batch_size = batch,
            fetched = candidates.len(),
            matched = total,
            returned = items.len(),
            "Client-processed search"
        );

        Ok(SearchResult {
            items,
            total,
            has_more,
            cursor,
            filter_note,
            suggestions,
        })
    }

    async fn fetch(&self, query: &CatalogQuery) -> Result<CatalogPage, SearchError> {
        match self.catalog.fetch_batch(query).await {
            Ok(page) => Ok(page),
            Err(CatalogError::NotFound(what)) => {
                tracing::debug!(what = %what, "Catalog reported no results");
                Ok(CatalogPage::empty(query.limit, query.offset))
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!(error = %e, "Catalog fetch failed");
                } else {
                    tracing::error!(error = %e, "Catalog returned an unusable response");
                }
                Err(e.into())
            }
        }
    }
}

fn catalog_query(request: &SearchRequest, limit: usize, offset: usize) -> CatalogQuery {
    CatalogQuery {
        search: request.query.clone(),
        form: request.form,
        conditions: request.conditions.clone(),
        min_protein: request.min_protein,
        max_carbs: request.max_carbs,
        limit,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{DerivedMetrics, Product, SortKey};
    use crate::ports::PageMeta;

    /// Catalog fake that pages over a fixed list and records every query.
    struct FakeCatalog {
        products: Vec<Product>,
        has_more_flag: bool,
        failure: Option<CatalogError>,
        queries: Mutex<Vec<CatalogQuery>>,
    }

    impl FakeCatalog {
        fn new(products: Vec<Product>) -> Self {
            Self {
                products,
                has_more_flag: true,
                failure: None,
                queries: Mutex::new(Vec::new()),
            }
        }

        fn last_query(&self) -> CatalogQuery {
            self.queries.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Catalog for FakeCatalog {
        async fn fetch_batch(&self, query: &CatalogQuery) -> Result<CatalogPage, CatalogError> {
            self.queries.lock().unwrap().push(query.clone());
            if let Some(err) = &self.failure {
                return Err(err.clone());
            }
            let items: Vec<Product> = self
                .products
                .iter()
                .skip(query.offset)
                .take(query.limit)
                .cloned()
                .collect();
            let total = self.products.len();
            Ok(CatalogPage {
                meta: PageMeta {
                    total,
                    limit: query.limit,
                    offset: query.offset,
                    has_more: self
                        .has_more_flag
                        .then_some(query.offset + items.len() < total),
                },
                items,
            })
        }

        async fn fetch_product(&self, id: &str) -> Result<Product, CatalogError> {
            self.products
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(id.to_string()))
        }
    }

    fn product(id: &str, preview: &[&str]) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Recipe {id}"),
            brand: "Acme".to_string(),
            form: None,
            condition_tags: vec![],
            ingredients_preview: preview.iter().map(|s| s.to_string()).collect(),
            ingredients_full: vec![],
            nutrition: None,
            derived_metrics: None,
        }
    }

    fn numbered(count: usize) -> Vec<Product> {
        (0..count)
            .map(|i| product(&format!("p{i:03}"), &["chicken", "rice"]))
            .collect()
    }

    fn pipeline(catalog: Arc<FakeCatalog>) -> SearchPipeline {
        SearchPipeline::new(catalog, Arc::new(PatternCache::default()))
    }

    #[test]
    fn test_batch_size_bounds() {
        assert_eq!(batch_size(10), DEFAULT_BATCH_SIZE);
        assert_eq!(batch_size(40), 80);
        assert_eq!(batch_size(500), MAX_BATCH_SIZE);
    }

    #[tokio::test]
    async fn test_pass_through_forwards_paging() {
        let catalog = Arc::new(FakeCatalog::new(numbered(25)));
        let pipeline = pipeline(catalog.clone());

        let request = SearchRequest {
            query: Some("salmon".to_string()),
            limit: 10,
            cursor: 10,
            ..Default::default()
        };
        let result = pipeline.execute(&request).await.unwrap();

        let query = catalog.last_query();
        assert_eq!((query.limit, query.offset), (10, 10));
        assert_eq!(query.search.as_deref(), Some("salmon"));
        assert_eq!(result.items.len(), 10);
        assert_eq!(result.items[0].id, "p010");
        assert_eq!(result.total, 25);
        assert!(result.has_more);
        assert_eq!(result.cursor, 20);
        assert_eq!(result.filter_note, None);
    }

    #[tokio::test]
    async fn test_degraded_exact_term_is_noted() {
        let catalog = Arc::new(FakeCatalog::new(vec![
            product("a", &["chicken & rice", "peas"]),
            product("b", &["salmon", "peas"]),
        ]));
        let pipeline = pipeline(catalog);

        let request = SearchRequest {
            include_terms: pipeline.parse_terms(Some(r#""chicken & rice""#)),
            ..Default::default()
        };
        let result = pipeline.execute(&request).await.unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].id, "a");
        let note = result.filter_note.unwrap();
        assert!(note.contains("matched as substrings: chicken & rice."));
    }

    #[tokio::test]
    async fn test_safe_exact_term_has_no_substring_note() {
        let catalog = Arc::new(FakeCatalog::new(vec![product("a", &["chicken", "peas"])]));
        let pipeline = pipeline(catalog);

        let request = SearchRequest {
            include_terms: pipeline.parse_terms(Some(r#""chicken""#)),
            ..Default::default()
        };
        let result = pipeline.execute(&request).await.unwrap();

        assert_eq!(result.total, 1);
        assert!(!result.filter_note.unwrap().contains("substrings"));
    }

    #[tokio::test]
    async fn test_pass_through_last_page_keeps_cursor() {
        let catalog = Arc::new(FakeCatalog::new(numbered(25)));
        let pipeline = pipeline(catalog);

        let request = SearchRequest {
            limit: 10,
            cursor: 20,
            ..Default::default()
        };
        let result = pipeline.execute(&request).await.unwrap();
        assert_eq!(result.items.len(), 5);
        assert!(!result.has_more);
        assert_eq!(result.cursor, 20);
    }

    #[tokio::test]
    async fn test_pass_through_infers_has_more_without_flag() {
        let mut fake = FakeCatalog::new(numbered(25));
        fake.has_more_flag = false;
        let pipeline = pipeline(Arc::new(fake));

        let first = pipeline.execute(&SearchRequest::default()).await.unwrap();
        assert!(first.has_more);
        assert_eq!(first.cursor, 10);

        let last = pipeline
            .execute(&SearchRequest {
                cursor: 15,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!last.has_more);
        assert_eq!(last.cursor, 15);
    }

    #[tokio::test]
    async fn test_client_mode_fetches_batch_from_offset_zero() {
        let catalog = Arc::new(FakeCatalog::new(numbered(30)));
        let pipeline = pipeline(catalog.clone());

        let request = SearchRequest {
            sort_by: Some(SortKey::ProteinDesc),
            limit: 5,
            cursor: 5,
            ..Default::default()
        };
        let result = pipeline.execute(&request).await.unwrap();

        let query = catalog.last_query();
        assert_eq!((query.limit, query.offset), (DEFAULT_BATCH_SIZE, 0));
        assert_eq!(result.total, 30);
        assert_eq!(result.items[0].id, "p005");
        assert_eq!(result.cursor, 10);
    }

    #[tokio::test]
    async fn test_client_mode_pagination_invariants() {
        let catalog = Arc::new(FakeCatalog::new(numbered(23)));
        let pipeline = pipeline(catalog);

        for limit in [1, 7, 10, 20] {
            for cursor in [0, 5, 16, 22, 23, 40] {
                let request = SearchRequest {
                    sort_by: Some(SortKey::CarbsAsc),
                    limit,
                    cursor,
                    ..Default::default()
                };
                let result = pipeline.execute(&request).await.unwrap();
                assert_eq!(result.total, 23);
                assert_eq!(result.cursor, cursor + result.items.len());
                assert_eq!(result.has_more, cursor + limit < result.total);
                assert!(result.items.len() <= limit);
            }
        }
    }

    #[tokio::test]
    async fn test_client_mode_filters_and_sorts() {
        let mut lean = product("lean", &["turkey", "peas"]);
        lean.derived_metrics = Some(DerivedMetrics {
            carb_estimated: Some(12.0),
            meat_score: None,
        });
        let mut starchy = product("starchy", &["turkey", "corn"]);
        starchy.derived_metrics = Some(DerivedMetrics {
            carb_estimated: Some(45.0),
            meat_score: None,
        });
        let unknown = product("unknown", &["turkey", "barley"]);
        let fish = product("fish", &["salmon"]);

        let catalog = Arc::new(FakeCatalog::new(vec![unknown, starchy, fish, lean]));
        let pipeline = pipeline(catalog);

        let request = SearchRequest {
            include_terms: pipeline.parse_terms(Some("turkey")),
            sort_by: Some(SortKey::CarbsAsc),
            ..Default::default()
        };
        let result = pipeline.execute(&request).await.unwrap();
        let ids: Vec<&str> = result.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["lean", "starchy", "unknown"]);
        assert!(result.filter_note.unwrap().contains("first 5 listed ingredients"));
        assert_eq!(result.suggestions, None);
    }

    #[tokio::test]
    async fn test_exclude_filter() {
        let catalog = Arc::new(FakeCatalog::new(vec![
            product("a", &["chicken", "corn"]),
            product("b", &["chicken", "rice"]),
        ]));
        let pipeline = pipeline(catalog);

        let request = SearchRequest {
            exclude_terms: pipeline.parse_terms(Some("corn")),
            ..Default::default()
        };
        let result = pipeline.execute(&request).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].id, "b");
    }

    #[tokio::test]
    async fn test_zero_exact_matches_yield_suggestions() {
        let catalog = Arc::new(FakeCatalog::new(vec![
            product("a", &["chicken", "rice"]),
            product("b", &["deboned chicken"]),
        ]));
        let pipeline = pipeline(catalog);

        let request = SearchRequest {
            include_terms: pipeline.parse_terms(Some(r#""chick""#)),
            ..Default::default()
        };
        let result = pipeline.execute(&request).await.unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total, 0);
        assert!(!result.has_more);
        let suggestions = result.suggestions.unwrap();
        assert!(suggestions[0].contains("No exact matches found"));
        assert!(suggestions[1].starts_with("2 products"));
    }

    #[tokio::test]
    async fn test_zero_matches_without_relaxed_hits_has_no_suggestions() {
        let catalog = Arc::new(FakeCatalog::new(vec![product("a", &["beef"])]));
        let pipeline = pipeline(catalog);

        let request = SearchRequest {
            include_terms: pipeline.parse_terms(Some(r#""chick""#)),
            ..Default::default()
        };
        let result = pipeline.execute(&request).await.unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.suggestions, None);
    }

    #[tokio::test]
    async fn test_ingredient_filter_without_ingredient_data_is_rejected() {
        let catalog = Arc::new(FakeCatalog::new(vec![product("a", &[]), product("b", &[])]));
        let pipeline = pipeline(catalog);

        let request = SearchRequest {
            include_terms: pipeline.parse_terms(Some("chicken")),
            ..Default::default()
        };
        let err = pipeline.execute(&request).await.unwrap_err();
        match err {
            SearchError::CapabilityMismatch(msg) => assert!(msg.contains("ingredient lists")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sort_without_ingredient_data_is_allowed() {
        let catalog = Arc::new(FakeCatalog::new(vec![product("a", &[])]));
        let pipeline = pipeline(catalog);

        let request = SearchRequest {
            sort_by: Some(SortKey::FatDesc),
            ..Default::default()
        };
        assert_eq!(pipeline.execute(&request).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_truncated_batch_is_noted() {
        let catalog = Arc::new(FakeCatalog::new(numbered(120)));
        let pipeline = pipeline(catalog);

        let request = SearchRequest {
            sort_by: Some(SortKey::ProteinDesc),
            ..Default::default()
        };
        let result = pipeline.execute(&request).await.unwrap();
        assert_eq!(result.total, DEFAULT_BATCH_SIZE);
        assert!(result.filter_note.unwrap().contains("first 50 of 120"));
    }

    #[tokio::test]
    async fn test_unavailable_catalog_propagates() {
        let mut fake = FakeCatalog::new(vec![]);
        fake.failure = Some(CatalogError::Unavailable("timeout".to_string()));
        let pipeline = pipeline(Arc::new(fake));

        let err = pipeline.execute(&SearchRequest::default()).await.unwrap_err();
        assert!(matches!(err, SearchError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_not_found_is_an_empty_page() {
        let mut fake = FakeCatalog::new(vec![]);
        fake.failure = Some(CatalogError::NotFound("products".to_string()));
        let pipeline = pipeline(Arc::new(fake));

        let result = pipeline.execute(&SearchRequest::default()).await.unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total, 0);
        assert!(!result.has_more);
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_catalog() {
        let catalog = Arc::new(FakeCatalog::new(numbered(3)));
        let pipeline = pipeline(catalog.clone());

        let request = SearchRequest {
            limit: 0,
            ..Default::default()
        };
        assert!(matches!(
            pipeline.execute(&request).await,
            Err(SearchError::Validation(_))
        ));
        assert!(catalog.queries.lock().unwrap().is_empty());
    }
}
