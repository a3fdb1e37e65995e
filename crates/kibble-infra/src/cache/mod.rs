//! Cache implementations.

mod memory;
mod product;

pub use memory::InMemoryCache;
pub use product::{ProductCache, ProductCacheConfig};
