//! # Kibble Core
//!
//! The domain layer of the Kibble catalog search service.
//! Product model, filter matching, sorting, suggestions and the search
//! pipeline itself. Everything that talks to the outside world sits behind
//! the traits in [`ports`].

pub mod classify;
pub mod domain;
pub mod error;
pub mod ports;
pub mod search;

pub use error::SearchError;
