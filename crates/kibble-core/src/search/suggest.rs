use super::matcher::{FilterTerm, MatchType, Searchable};

/// Advisory hints for an empty filtered result.
///
/// Re-runs the filters over the unfiltered batch with every term relaxed
/// to a substring match. Returns `None` when that finds nothing either.
pub fn suggest(
    candidates: &[Searchable],
    include: &[FilterTerm],
    exclude: &[FilterTerm],
) -> Option<Vec<String>> {
    if include.is_empty() && exclude.is_empty() {
        return None;
    }

    let relaxed_include: Vec<FilterTerm> = include.iter().map(FilterTerm::relaxed).collect();
    let relaxed_exclude: Vec<FilterTerm> = exclude.iter().map(FilterTerm::relaxed).collect();

    let relaxed_matches = candidates
        .iter()
        .filter(|c| c.passes(&relaxed_include, &relaxed_exclude))
        .count();

    if relaxed_matches == 0 {
        return None;
    }

    let exact_terms: Vec<String> = include
        .iter()
        .chain(exclude)
        .filter(|t| t.match_type == MatchType::Exact)
        .map(|t| format!("\"{}\"", t.normalized_value))
        .collect();

    let first = if exact_terms.is_empty() {
        "No exact matches found.".to_string()
    } else {
        format!("No exact matches found for {}.", exact_terms.join(", "))
    };

    let second = format!(
        "{} product{} match with partial matching; remove the quotes to include them.",
        relaxed_matches,
        if relaxed_matches == 1 { "" } else { "s" }
    );

    Some(vec![first, second])
}
