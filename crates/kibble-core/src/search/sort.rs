use crate::domain::{Product, SortKey};

/// Carb estimate assumed for products that do not publish one, so they sort last.
const MISSING_CARBS: f64 = 999.0;

/// Stable in-place sort. Missing nutrients count as zero; missing carb
/// estimates count as [`MISSING_CARBS`]. Unrecognized keys leave the order untouched.
pub fn sort_products<T: AsRef<Product>>(items: &mut [T], key: &SortKey) {
    match key {
        SortKey::ProteinDesc => descending(items, |p| p.protein()),
        SortKey::FatDesc => descending(items, |p| p.fat()),
        SortKey::MoistureDesc => descending(items, |p| p.moisture()),
        SortKey::CarbsAsc => {
            items.sort_by(|a, b| carbs(a.as_ref()).total_cmp(&carbs(b.as_ref())))
        }
        SortKey::Unrecognized(other) => {
            tracing::debug!(sort_by = %other, "Unknown sort key, keeping catalog order");
        }
    }
}

fn carbs(product: &Product) -> f64 {
    product.carbs_estimated().unwrap_or(MISSING_CARBS)
}

fn descending<T, F>(items: &mut [T], field: F)
where
    T: AsRef<Product>,
    F: Fn(&Product) -> Option<f64>,
{
    items.sort_by(|a, b| {
        let a = field(a.as_ref()).unwrap_or(0.0);
        let b = field(b.as_ref()).unwrap_or(0.0);
        b.total_cmp(&a)
    });
}
