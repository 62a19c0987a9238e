//! Analysis modules.
//!
//! Extraction of per-base quality vectors from FastQC reports and their
//! aggregation into one table.

pub mod aggregator;
pub mod extractor;

pub use aggregator::*;
pub use extractor::*;
