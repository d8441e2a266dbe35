//! Mapping-sheet loading.
//!
//! The mapping sheet is a CSV export of the curated crosswalk workbook. Each
//! row pairs a source data element with a target data element and carries
//! the value correspondence, change flags and special-mapping tag.

use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, info};
use uds_common::is_missing_token;
use uds_model::{ChangeFlag, RuleKind, SpecRow, SpecialMapping};

use crate::error::{IngestError, Result, file_error};

pub const SOURCE_ELEMENT: &str = "uds3 data element";
pub const TARGET_ELEMENT: &str = "uds4 data element";
pub const MAPPING_TYPE: &str = "mapping type";
const SOURCE_VALUE: &str = "uds3 value";
const TARGET_VALUE: &str = "uds4 value";
const REVERSIBLE: &str = "reversible to uds3";
const NOTES: &str = "notes and discussion points";
const TYPE_CHANGE: &str = "data type change";
const CONFORMITY_CHANGE: &str = "conformity change";
const FORM_CHANGE: &str = "change in form";
const SPECIAL_MAPPING: &str = "special mapping";

/// Positions of the known columns within a sheet header.
#[derive(Debug, Clone, Copy)]
struct SheetColumns {
    source: usize,
    target: usize,
    mapping_type: usize,
    source_value: Option<usize>,
    target_value: Option<usize>,
    reversible: Option<usize>,
    notes: Option<usize>,
    type_change: Option<usize>,
    conformity_change: Option<usize>,
    form_change: Option<usize>,
    special_mapping: Option<usize>,
}

impl SheetColumns {
    fn locate(headers: &[String], path: &Path) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| IngestError::MissingColumn {
                column: name.to_string(),
                path: path.to_path_buf(),
            })
        };
        Ok(Self {
            source: require(SOURCE_ELEMENT)?,
            target: require(TARGET_ELEMENT)?,
            mapping_type: require(MAPPING_TYPE)?,
            source_value: find(SOURCE_VALUE),
            target_value: find(TARGET_VALUE),
            reversible: find(REVERSIBLE),
            notes: find(NOTES),
            type_change: find(TYPE_CHANGE),
            conformity_change: find(CONFORMITY_CHANGE),
            form_change: find(FORM_CHANGE),
            special_mapping: find(SPECIAL_MAPPING),
        })
    }
}

/// Lowercase a header cell and collapse internal whitespace.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Reads the specification rows of a mapping sheet.
///
/// Rows missing either data element name are skipped. Blank value cells and
/// the usual missing-value tokens read as absent.
pub fn read_spec_rows(path: &Path) -> Result<Vec<SpecRow>> {
    let file = std::fs::File::open(path).map_err(|e| file_error(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, &e))?
        .iter()
        .map(normalize_header)
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    let columns = SheetColumns::locate(&headers, path)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, &e))?;
        let cell = |index: Option<usize>| -> Option<&str> {
            index
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|value| !is_missing_token(value))
        };
        let flag = |index: Option<usize>| cell(index).map_or(ChangeFlag::Unset, ChangeFlag::parse);

        let (Some(source), Some(target)) = (cell(Some(columns.source)), cell(Some(columns.target)))
        else {
            skipped += 1;
            continue;
        };
        let mapping_type = RuleKind::parse(cell(Some(columns.mapping_type)).unwrap_or_default());

        let mut row = SpecRow::new(source, target, mapping_type)
            .with_values(cell(columns.source_value), cell(columns.target_value))
            .with_flags(
                flag(columns.type_change),
                flag(columns.conformity_change),
                flag(columns.form_change),
            )
            .with_special_mapping(cell(columns.special_mapping).and_then(SpecialMapping::parse));
        row.reversible = cell(columns.reversible).map(str::to_string);
        row.note = cell(columns.notes).map(str::to_string);
        rows.push(row);
    }

    if skipped > 0 {
        debug!(path = %path.display(), skipped, "skipped rows without both data elements");
    }
    info!(path = %path.display(), rows = rows.len(), "loaded mapping sheet");
    Ok(rows)
}

fn csv_error(path: &Path, err: &csv::Error) -> IngestError {
    IngestError::CsvParse {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
