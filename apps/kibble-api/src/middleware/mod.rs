//! Request admission and error mapping.

pub mod error;
pub mod rate_limit;
