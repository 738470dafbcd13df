//! Candidate selection for the deletion pipeline.
//!
//! The scanner applies the filter to every listed entry and batches the keys
//! that pass.

mod filter_properties;
pub mod mtime_before;

pub use mtime_before::MtimeBeforeFilter;
