//! Property-based tests for candidate selection.
