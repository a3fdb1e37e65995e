//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Query string of `GET /api/products/search`.
///
/// Everything arrives as text so malformed values become validation
/// errors with rate-limit metadata instead of bare extractor failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProductsQuery {
    pub query: Option<String>,
    pub form: Option<String>,
    pub conditions: Option<String>,
    pub include_ingredients: Option<String>,
    pub exclude_ingredients: Option<String>,
    pub min_protein: Option<String>,
    pub max_carbs: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

/// Rate-limit state attached to every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_epoch_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummaryDto {
    pub id: String,
    pub name: String,
    pub brand: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    pub ingredients_preview: Vec<String>,
    pub detail_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProductsResponse {
    pub items: Vec<ProductSummaryDto>,
    pub total: usize,
    pub has_more: bool,
    pub cursor: usize,
    pub rate_limit: RateLimitInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionDto {
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub moisture: Option<f64>,
    pub carb_estimated: Option<f64>,
    pub meat_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientDto {
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    pub id: String,
    pub name: String,
    pub brand: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    pub condition_tags: Vec<String>,
    pub ingredients: Vec<IngredientDto>,
    pub nutrition: NutritionDto,
    pub rate_limit: RateLimitInfo,
}
