//! Input file discovery and column-order lists.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IngestError, Result, file_error};

/// Lists the files in a directory with the given extension.
///
/// The extension match is case-insensitive. Returns files sorted by filename.
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(dir = %dir.display(), extension, count = files.len(), "listed input files");
    Ok(files)
}

/// Expands a mix of files and directories into a list of files.
///
/// Directories contribute their files with the given extension in sorted
/// order; plain files are kept as given.
pub fn collect_inputs(inputs: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(list_files(input, extension)?);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(IngestError::FileNotFound {
                path: input.clone(),
            });
        }
    }
    Ok(files)
}

/// Reads a recognized-column list: one name per line.
///
/// Names are trimmed and lowercased; blank lines are skipped.
pub fn read_column_order(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| file_error(path, e))?;
    let order: Vec<String> = text
        .lines()
        .map(|line| line.trim_matches('\u{feff}').trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .collect();
    debug!(path = %path.display(), columns = order.len(), "loaded column order");
    Ok(order)
}
