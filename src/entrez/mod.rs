//! NCBI Entrez access.
//!
//! Query construction and the count service used by the collector.

pub mod client;
pub mod query;

pub use client::{CountService, EntrezClient};
#[cfg(test)]
pub use client::EntrezError;
pub use query::EntrezQuery;
