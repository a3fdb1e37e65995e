//! Ingredient categorization.
//!
//! Two pure functions: a keyword lookup over a fixed per-category table,
//! and a pattern-based fallback for names the table does not cover.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientCategory {
    Meat,
    Organ,
    Fish,
    Fat,
    Grain,
    Legume,
    Vegetable,
    Fruit,
    Supplement,
    Other,
}

impl IngredientCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientCategory::Meat => "meat",
            IngredientCategory::Organ => "organ",
            IngredientCategory::Fish => "fish",
            IngredientCategory::Fat => "fat",
            IngredientCategory::Grain => "grain",
            IngredientCategory::Legume => "legume",
            IngredientCategory::Vegetable => "vegetable",
            IngredientCategory::Fruit => "fruit",
            IngredientCategory::Supplement => "supplement",
            IngredientCategory::Other => "other",
        }
    }
}

/// Checked in order; the first category with a hit wins, so the more
/// specific categories come before `Meat`.
static KEYWORDS: &[(IngredientCategory, &[&str])] = &[
    (
        IngredientCategory::Fat,
        &["fish oil", "salmon oil", "chicken fat", "beef fat", "pork fat", "coconut oil", "canola oil", "sunflower oil", "tallow", "lard"],
    ),
    (
        IngredientCategory::Organ,
        &["liver", "heart", "kidney", "gizzard", "tripe", "lung", "spleen", "giblets"],
    ),
    (
        IngredientCategory::Fish,
        &["salmon", "fish", "tuna", "whitefish", "herring", "sardine", "anchovy", "mackerel", "pollock", "cod", "trout", "menhaden"],
    ),
    (
        IngredientCategory::Meat,
        &["chicken", "beef", "turkey", "lamb", "pork", "duck", "venison", "bison", "rabbit", "poultry", "meat", "goat", "quail"],
    ),
    (
        IngredientCategory::Legume,
        &["pea", "peas", "lentil", "lentils", "chickpea", "chickpeas", "bean", "beans", "soy", "soybean"],
    ),
    (
        IngredientCategory::Grain,
        &["rice", "corn", "wheat", "barley", "oat", "oats", "oatmeal", "sorghum", "millet", "quinoa", "rye"],
    ),
    (
        IngredientCategory::Vegetable,
        &["potato", "potatoes", "sweet potato", "carrot", "carrots", "spinach", "pumpkin", "kale", "broccoli", "beet", "tomato"],
    ),
    (
        IngredientCategory::Fruit,
        &["apple", "apples", "blueberry", "blueberries", "cranberry", "cranberries", "banana", "pear"],
    ),
];

static PATTERNS: LazyLock<Vec<(Regex, IngredientCategory)>> = LazyLock::new(|| {
    [
        (
            r"\b(vitamin|supplement|chelate|proteinate|sulfate|oxide|chloride|iodate|selenite|carbonate|phosphate|taurine|choline|mononitrate|hydrochloride|biotin|riboflavin|niacin|folic)\b",
            IngredientCategory::Supplement,
        ),
        (r"\b(oil|fat|tallow|lard)\b", IngredientCategory::Fat),
        (r"\b(meal|by-products?|digest)\b", IngredientCategory::Meat),
        (r"\b(flour|starch|bran|grits|gluten)\b", IngredientCategory::Grain),
        (r"\b(protein|fiber|pulp)\b$", IngredientCategory::Vegetable),
    ]
    .into_iter()
    .map(|(pattern, category)| (Regex::new(pattern).expect("Valid ingredient pattern"), category))
    .collect()
});

/// Categorize an ingredient name.
pub fn classify_ingredient(name: &str) -> IngredientCategory {
    let normalized = name.trim().to_lowercase();
    classify_by_keyword(&normalized).unwrap_or_else(|| classify_by_pattern(&normalized))
}

/// Keyword table lookup. Single-word keywords must match a whole word;
/// multi-word keywords match as a phrase.
pub fn classify_by_keyword(normalized: &str) -> Option<IngredientCategory> {
    let words: Vec<&str> = normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    KEYWORDS.iter().find_map(|(category, keywords)| {
        keywords
            .iter()
            .any(|kw| {
                if kw.contains(' ') {
                    normalized.contains(kw)
                } else {
                    words.contains(kw)
                }
            })
            .then_some(*category)
    })
}

/// Pattern rules for names the keyword table does not know.
pub fn classify_by_pattern(normalized: &str) -> IngredientCategory {
    PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(normalized))
        .map(|(_, category)| *category)
        .unwrap_or(IngredientCategory::Other)
}
