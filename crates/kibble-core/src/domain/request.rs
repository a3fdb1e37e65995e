use std::fmt;

use serde::{Deserialize, Serialize};

use super::product::{ProductForm, ProductSummary};
use crate::error::SearchError;
use crate::search::FilterTerm;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 20;
pub const MAX_QUERY_LEN: usize = 256;

/// Client-side sort orders. Upstream cannot sort, so any of these forces
/// the pipeline into client-processed mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    ProteinDesc,
    CarbsAsc,
    FatDesc,
    MoistureDesc,
    /// Any other value. Sorting by it keeps the catalog order.
    Unrecognized(String),
}

impl SortKey {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "protein_desc" => SortKey::ProteinDesc,
            "carbs_asc" => SortKey::CarbsAsc,
            "fat_desc" => SortKey::FatDesc,
            "moisture_desc" => SortKey::MoistureDesc,
            other => SortKey::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::ProteinDesc => f.write_str("protein_desc"),
            SortKey::CarbsAsc => f.write_str("carbs_asc"),
            SortKey::FatDesc => f.write_str("fat_desc"),
            SortKey::MoistureDesc => f.write_str("moisture_desc"),
            SortKey::Unrecognized(other) => f.write_str(other),
        }
    }
}

/// A single search call after parsing.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub form: Option<ProductForm>,
    pub conditions: Vec<String>,
    pub include_terms: Vec<FilterTerm>,
    pub exclude_terms: Vec<FilterTerm>,
    pub min_protein: Option<f64>,
    pub max_carbs: Option<f64>,
    pub sort_by: Option<SortKey>,
    pub limit: usize,
    pub cursor: usize,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: None,
            form: None,
            conditions: Vec::new(),
            include_terms: Vec::new(),
            exclude_terms: Vec::new(),
            min_protein: None,
            max_carbs: None,
            sort_by: None,
            limit: DEFAULT_LIMIT,
            cursor: 0,
        }
    }
}

impl SearchRequest {
    pub fn validate(&self) -> Result<(), SearchError> {
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(SearchError::Validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        if let Some(query) = &self.query {
            if query.chars().count() > MAX_QUERY_LEN {
                return Err(SearchError::Validation(format!(
                    "query must be at most {MAX_QUERY_LEN} characters"
                )));
            }
        }
        Ok(())
    }

    pub fn has_ingredient_filters(&self) -> bool {
        !self.include_terms.is_empty() || !self.exclude_terms.is_empty()
    }

    /// Upstream paginates natively only when nothing needs local filtering or sorting.
    pub fn needs_client_side_processing(&self) -> bool {
        self.sort_by.is_some() || self.has_ingredient_filters()
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub items: Vec<ProductSummary>,
    pub total: usize,
    pub has_more: bool,
    /// Offset to pass as `cursor` for the next page.
    pub cursor: usize,
    pub filter_note: Option<String>,
    pub suggestions: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(SortKey::parse("carbs_asc"), SortKey::CarbsAsc);
        assert_eq!(
            SortKey::parse("price_asc"),
            SortKey::Unrecognized("price_asc".to_string())
        );
        assert_eq!(SortKey::parse("fat_desc").to_string(), "fat_desc");
    }

    #[test]
    fn test_validate_limit_bounds() {
        let mut req = SearchRequest::default();
        assert!(req.validate().is_ok());
        req.limit = 0;
        assert!(req.validate().is_err());
        req.limit = MAX_LIMIT + 1;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_query_length() {
        let req = SearchRequest {
            query: Some("a".repeat(MAX_QUERY_LEN + 1)),
            ..Default::default()
        };
        assert!(matches!(req.validate(), Err(SearchError::Validation(_))));
    }

    #[test]
    fn test_mode_selection() {
        let mut req = SearchRequest::default();
        assert!(!req.needs_client_side_processing());
        req.sort_by = Some(SortKey::Unrecognized("x".to_string()));
        assert!(req.needs_client_side_processing());
    }
}
