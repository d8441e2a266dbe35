//! Shared utilities for UDS crosswalk crates.
//!
//! This crate provides common utilities used across the crosswalk workspace,
//! including Polars `AnyValue` helpers and missing-value token handling.

pub mod missing;
pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use missing::{NA_LITERAL, is_missing_token};
pub use polars::{any_to_string, format_numeric, parse_f64, parse_i64};
