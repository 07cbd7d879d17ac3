//! Analysis modules.
//!
//! Aggregation of collected counts into totals, rankings and summaries.

pub mod aggregator;

pub use aggregator::*;
