//! Catalog adapters.

mod fixture;

#[cfg(feature = "http-catalog")]
mod http;

pub use fixture::FixtureCatalog;

#[cfg(feature = "http-catalog")]
pub use self::http::{HttpCatalog, HttpCatalogConfig};
