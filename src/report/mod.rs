//! Report rendering for review summary sections.

pub mod generator;

pub use generator::*;
