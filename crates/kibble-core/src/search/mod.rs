//! Hybrid search: server-side pagination when upstream can serve the
//! request as-is, client-side filter/sort/re-pagination when it cannot.

mod matcher;
mod pipeline;
mod sort;
mod suggest;

pub use matcher::{DEFAULT_PATTERN_CACHE_SIZE, FilterTerm, MatchType, PatternCache, Searchable};
pub use pipeline::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE, SearchPipeline, batch_size};
pub use sort::sort_products;
pub use suggest::suggest;
