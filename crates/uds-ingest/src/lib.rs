//! Crosswalk input loading.
//!
//! This crate reads the inputs of a migration run:
//!
//! - **Source tables**: source-schema CSV exports loaded into Polars DataFrames
//! - **Mapping sheets**: CSV exports of the curated crosswalk workbook
//! - **Column orders**: the recognized target columns, one per line
//! - **Discovery**: sorted listing of rule files and mapping sheets
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use uds_ingest::{read_column_order, read_source_table, read_spec_rows};
//!
//! let source = read_source_table(Path::new("uds3.csv"))?;
//! let rows = read_spec_rows(Path::new("a1_crosswalk.csv"))?;
//! let order = read_column_order(Path::new("uds4_columns.txt"))?;
//! ```

mod discovery;
mod error;
mod source;
mod spec_sheet;

// === Error Types ===
pub use error::{IngestError, Result};

// === Source Tables ===
pub use source::{normalize_column_name, read_source_table};

// === Mapping Sheets ===
pub use spec_sheet::{MAPPING_TYPE, SOURCE_ELEMENT, TARGET_ELEMENT, normalize_header, read_spec_rows};

// === Discovery ===
pub use discovery::{collect_inputs, list_files, read_column_order};
