//! Crate-level property-based tests.
//!
//! Each sub-module checks one area end to end with proptest-generated input.

mod logging_properties;
mod pipeline_properties;
