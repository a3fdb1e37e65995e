//! Ingredient filter terms.
//!
//! A term wrapped in double quotes is an exact, word-bounded match; anything
//! else is a case-insensitive substring match. Exact literals are only
//! compiled into a pattern when they consist of letters, digits, spaces and
//! `-'.()`; anything else quietly falls back to substring matching.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use regex::Regex;

use crate::domain::Product;

const SAFE_PUNCTUATION: &[char] = &[' ', '-', '\'', '.', '(', ')'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Exact,
    Partial,
}

/// One parsed include/exclude term.
#[derive(Debug, Clone)]
pub struct FilterTerm {
    pub raw_value: String,
    pub match_type: MatchType,
    pub normalized_value: String,
    compiled: Option<Arc<Regex>>,
}

impl FilterTerm {
    /// Parse a single term. Returns `None` when nothing is left after trimming.
    pub fn parse(raw: &str, patterns: &PatternCache) -> Option<Self> {
        let trimmed = raw.trim();
        let quoted = trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"');

        if !quoted {
            let normalized = trimmed.trim_matches('"').trim().to_lowercase();
            if normalized.is_empty() {
                return None;
            }
            return Some(Self::partial(trimmed, normalized));
        }

        let normalized = trimmed[1..trimmed.len() - 1].trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        let compiled = if is_safe_literal(&normalized) {
            match patterns.get_or_compile(&normalized) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::warn!(term = %normalized, error = %e, "Exact pattern failed to compile, using substring match");
                    None
                }
            }
        } else {
            tracing::warn!(term = %normalized, "Unsafe characters in exact term, using substring match");
            None
        };

        Some(Self {
            raw_value: trimmed.to_string(),
            match_type: MatchType::Exact,
            normalized_value: normalized,
            compiled,
        })
    }

    /// Parse comma-separated user input into terms, skipping blanks.
    pub fn parse_list(input: &str, patterns: &PatternCache) -> Vec<Self> {
        input
            .split(',')
            .filter_map(|part| Self::parse(part, patterns))
            .collect()
    }

    fn partial(raw: &str, normalized: String) -> Self {
        Self {
            raw_value: raw.to_string(),
            match_type: MatchType::Partial,
            normalized_value: normalized,
            compiled: None,
        }
    }

    /// The same term with quotes ignored: always a substring match.
    pub fn relaxed(&self) -> Self {
        Self::partial(&self.raw_value, self.normalized_value.clone())
    }

    /// Exact in name but matched by substring because the literal was unsafe.
    pub fn is_degraded(&self) -> bool {
        self.match_type == MatchType::Exact && self.compiled.is_none()
    }

    /// Test against already-lowercased searchable text.
    pub fn matches(&self, text: &str) -> bool {
        match &self.compiled {
            Some(regex) => regex.is_match(text),
            None => text.contains(&self.normalized_value),
        }
    }
}

fn is_safe_literal(literal: &str) -> bool {
    literal
        .chars()
        .all(|c| c.is_alphanumeric() || SAFE_PUNCTUATION.contains(&c))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Word-bounded pattern over an escaped literal. A boundary is only
/// asserted on a side that ends in a word character, so literals such as
/// `vitamin e (d-alpha)` can still match at the end of a field.
fn exact_pattern(literal: &str) -> String {
    let leading = literal.chars().next().is_some_and(is_word_char);
    let trailing = literal.chars().last().is_some_and(is_word_char);
    format!(
        "{}{}{}",
        if leading { r"\b" } else { "" },
        regex::escape(literal),
        if trailing { r"\b" } else { "" },
    )
}

/// Compiled patterns kept by [`PatternCache::default`].
pub const DEFAULT_PATTERN_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(256).unwrap();

/// Bounded LRU of compiled exact-match patterns keyed by normalized literal.
pub struct PatternCache {
    patterns: Mutex<LruCache<String, Arc<Regex>>>,
}

impl PatternCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            patterns: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get_or_compile(&self, literal: &str) -> Result<Arc<Regex>, regex::Error> {
        let mut patterns = self.patterns.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(regex) = patterns.get(literal) {
            return Ok(regex.clone());
        }

        let regex = Arc::new(Regex::new(&exact_pattern(literal))?);
        patterns.put(literal.to_string(), regex.clone());
        Ok(regex)
    }

    pub fn len(&self) -> usize {
        self.patterns.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_CACHE_SIZE)
    }
}

/// A product paired with its search text, computed once per request.
#[derive(Debug, Clone)]
pub struct Searchable {
    pub product: Product,
    text: String,
}

impl Searchable {
    pub fn new(product: Product) -> Self {
        let text = product.search_text();
        Self { product, text }
    }

    /// Every include term matches and no exclude term does.
    pub fn passes(&self, include: &[FilterTerm], exclude: &[FilterTerm]) -> bool {
        include.iter().all(|term| term.matches(&self.text))
            && !exclude.iter().any(|term| term.matches(&self.text))
    }
}

impl AsRef<Product> for Searchable {
    fn as_ref(&self) -> &Product {
        &self.product
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, preview: &[&str]) -> Searchable {
        Searchable::new(Product {
            id: id.to_string(),
            name: format!("Food {id}"),
            brand: "Acme".to_string(),
            form: None,
            condition_tags: vec![],
            ingredients_preview: preview.iter().map(|s| s.to_string()).collect(),
            ingredients_full: vec![],
            nutrition: None,
            derived_metrics: None,
        })
    }

    fn ids(items: &[Searchable], include: &[FilterTerm], exclude: &[FilterTerm]) -> Vec<String> {
        items
            .iter()
            .filter(|c| c.passes(include, exclude))
            .map(|c| c.product.id.clone())
            .collect()
    }

    fn corpus() -> Vec<Searchable> {
        vec![
            candidate("a", &["chicken meal", "rice"]),
            candidate("b", &["chicken", "fish broth"]),
        ]
    }

    #[test]
    fn test_quoted_term_is_exact() {
        let patterns = PatternCache::default();
        let term = FilterTerm::parse(r#" "Chicken Meal" "#, &patterns).unwrap();
        assert_eq!(term.match_type, MatchType::Exact);
        assert_eq!(term.normalized_value, "chicken meal");
        assert!(!term.is_degraded());
        assert_eq!(ids(&corpus(), &[term], &[]), vec!["a"]);
    }

    #[test]
    fn test_unquoted_term_is_partial() {
        let patterns = PatternCache::default();
        let terms = FilterTerm::parse_list("chicken", &patterns);
        assert_eq!(terms[0].match_type, MatchType::Partial);
        assert_eq!(ids(&corpus(), &terms, &[]), vec!["a", "b"]);
    }

    #[test]
    fn test_include_terms_are_conjunctive() {
        let patterns = PatternCache::default();
        let terms = FilterTerm::parse_list("chicken, rice", &patterns);
        assert_eq!(terms.len(), 2);
        assert_eq!(ids(&corpus(), &terms, &[]), vec!["a"]);
    }

    #[test]
    fn test_exclude_drops_only_matching_candidates() {
        let patterns = PatternCache::default();
        let mut items = corpus();
        items.push(candidate("c", &["corn", "chicken"]));
        let exclude = FilterTerm::parse_list("corn", &patterns);
        assert_eq!(ids(&items, &[], &exclude), vec!["a", "b"]);
    }

    #[test]
    fn test_exact_term_respects_word_boundaries() {
        let patterns = PatternCache::default();
        let term = FilterTerm::parse(r#""chick""#, &patterns).unwrap();
        assert!(ids(&corpus(), &[term.clone()], &[]).is_empty());
        assert_eq!(ids(&corpus(), &[term.relaxed()], &[]), vec!["a", "b"]);
    }

    #[test]
    fn test_exact_term_with_trailing_punctuation() {
        let patterns = PatternCache::default();
        let term = FilterTerm::parse(r#""vitamin e (supplement)""#, &patterns).unwrap();
        assert!(!term.is_degraded());
        assert!(term.matches("taurine\nvitamin e (supplement)"));
    }

    #[test]
    fn test_unsafe_exact_term_degrades_to_substring() {
        let patterns = PatternCache::default();
        let term = FilterTerm::parse(r#""chick.*|rice""#, &patterns).unwrap();
        assert!(term.is_degraded());
        assert!(!term.matches("chicken meal\nrice"));
        assert!(term.matches("weird chick.*|rice label"));
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_blank_terms_are_skipped() {
        let patterns = PatternCache::default();
        let terms = FilterTerm::parse_list(r#" , "", rice ,"#, &patterns);
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].normalized_value, "rice");
    }

    #[test]
    fn test_pattern_cache_reuses_compiled_pattern() {
        let patterns = PatternCache::new(NonZeroUsize::new(2).unwrap());
        let first = patterns.get_or_compile("rice").unwrap();
        let second = patterns.get_or_compile("rice").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        patterns.get_or_compile("corn").unwrap();
        patterns.get_or_compile("pea").unwrap();
        assert_eq!(patterns.len(), 2);
    }
}
