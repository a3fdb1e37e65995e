use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Number of leading ingredients the catalog publishes as a preview.
pub const PREVIEW_LEN: usize = 5;

/// Physical form of a food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductForm {
    Dry,
    Wet,
}

impl ProductForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductForm::Dry => "dry",
            ProductForm::Wet => "wet",
        }
    }
}

impl fmt::Display for ProductForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductForm {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dry" => Ok(ProductForm::Dry),
            "wet" => Ok(ProductForm::Wet),
            other => Err(SearchError::Validation(format!(
                "form must be 'dry' or 'wet', got '{other}'"
            ))),
        }
    }
}

/// Guaranteed analysis, in percent. Any field may be unpublished.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub fiber: Option<f64>,
    #[serde(default)]
    pub moisture: Option<f64>,
}

/// Metrics the catalog computes from the analysis and ingredient list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    #[serde(default)]
    pub carb_estimated: Option<f64>,
    #[serde(default)]
    pub meat_score: Option<f64>,
}

/// A catalog item as returned by the upstream catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub form: Option<ProductForm>,
    #[serde(default)]
    pub condition_tags: Vec<String>,
    #[serde(default)]
    pub ingredients_preview: Vec<String>,
    #[serde(default)]
    pub ingredients_full: Vec<String>,
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
    #[serde(default)]
    pub derived_metrics: Option<DerivedMetrics>,
}

impl Product {
    /// Leading ingredients, capped at [`PREVIEW_LEN`] whatever upstream sent.
    pub fn preview(&self) -> &[String] {
        let end = self.ingredients_preview.len().min(PREVIEW_LEN);
        &self.ingredients_preview[..end]
    }

    /// Lowercased text the ingredient filters are evaluated against:
    /// name, brand, condition tags and the ingredient preview.
    ///
    /// Fields are newline-separated so a partial term never matches
    /// across two fields.
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(2 + self.condition_tags.len() + PREVIEW_LEN);
        parts.push(&self.name);
        parts.push(&self.brand);
        parts.extend(self.condition_tags.iter().map(String::as_str));
        parts.extend(self.preview().iter().map(String::as_str));
        parts.join("\n").to_lowercase()
    }

    /// True if the catalog published any ingredient list for this item.
    pub fn has_ingredient_data(&self) -> bool {
        !self.ingredients_preview.is_empty() || !self.ingredients_full.is_empty()
    }

    pub fn protein(&self) -> Option<f64> {
        self.nutrition.as_ref().and_then(|n| n.protein)
    }

    pub fn fat(&self) -> Option<f64> {
        self.nutrition.as_ref().and_then(|n| n.fat)
    }

    pub fn moisture(&self) -> Option<f64> {
        self.nutrition.as_ref().and_then(|n| n.moisture)
    }

    pub fn carbs_estimated(&self) -> Option<f64> {
        self.derived_metrics.as_ref().and_then(|m| m.carb_estimated)
    }
}

impl AsRef<Product> for Product {
    fn as_ref(&self) -> &Product {
        self
    }
}

/// Trimmed projection of a product returned in search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub form: Option<ProductForm>,
    pub ingredients_preview: Vec<String>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            form: product.form,
            ingredients_preview: product.preview().to_vec(),
        }
    }
}
