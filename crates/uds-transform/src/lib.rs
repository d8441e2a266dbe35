//! Crosswalk engine: applies compiled rule sets to a source table.
//!
//! - **frame**: Polars-backed tables and column masks
//! - **engine**: per-entry dispatch across the four rule categories
//! - **structured**, **conformity**, **repeating**: the individual passes
//! - **postprocess**: stop-field propagation, `NA` normalization and column order

mod conformity;
mod engine;
mod error;
mod postprocess;
mod repeating;
mod resolve;
mod structured;

pub mod condition;
pub mod expr;
pub mod frame;
pub mod lookup;
pub mod report;

// === Engine ===
pub use engine::CrosswalkEngine;
pub use error::{Result, TransformError};

// === Passes ===
pub use conformity::{max_columns, normalize_conformity_value, value_sets_match};
pub use repeating::{expand_repeating, member_name};
pub use resolve::{ALTERNATIVE_SEPARATOR, resolve_alternatives, resolve_source_name};
pub use structured::{StructuredForm, form_date_column, paste_components};

// === Post-processing ===
pub use postprocess::{finalize, normalize_missing, propagate_stops};

// === Building blocks ===
pub use condition::{Clause, Condition, Logic, Operand};
pub use expr::{BinaryOp, Expr, Expression};
pub use frame::{ColumnKind, Frame, missing_or_na, numeric_text, text_matches};
pub use lookup::{KeyForm, NULL_KEY, ResponseLookup};
pub use report::{Gap, GapReason, RepeatOutcome, RunReport};
