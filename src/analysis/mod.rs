//! Analysis modules.
//!
//! Aggregation of raw reviews into summary statistics.

pub mod aggregator;

pub use aggregator::*;
