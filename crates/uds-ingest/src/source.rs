//! Source-table loading.

use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{IngestError, Result};

/// Reads a source-schema CSV export into a DataFrame.
///
/// Every column is read as text; cell typing happens when the table is
/// converted for the engine. Column names are trimmed and lowercased, and a
/// leading byte-order mark is dropped.
pub fn read_source_table(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    for name in &names {
        let normalized = normalize_column_name(name);
        if normalized != *name {
            debug!(from = %name, to = %normalized, "normalized source column name");
            df.rename(name, normalized.into())?;
        }
    }

    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded source table"
    );
    Ok(df)
}

/// Lowercase a header cell and drop surrounding whitespace and BOM.
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}
