//! Source-name resolution.

use polars::prelude::ChunkZip;
use tracing::debug;
use uds_model::CrosswalkConfig;

use crate::error::Result;
use crate::frame::{Frame, missing_or_na};

/// Separator joining two candidate source columns.
pub const ALTERNATIVE_SEPARATOR: &str = " | ";

/// Lowercase a rule's source name and map it through the rename table.
pub fn resolve_source_name(config: &CrosswalkConfig, raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    config.resolve_source(&lowered).to_string()
}

/// Pick one column from a `first | second` source name.
///
/// When both columns exist, null or `NA` cells of the first are back-filled
/// from the second and the first is used. Otherwise whichever exists is
/// used, falling back to the second. Names that do not split into exactly
/// two candidates are returned unchanged.
pub fn resolve_alternatives(source: &mut Frame, name: &str) -> Result<String> {
    let parts: Vec<&str> = name.split(ALTERNATIVE_SEPARATOR).collect();
    let [primary, secondary] = parts.as_slice() else {
        return Ok(name.to_string());
    };

    let resolved = match (source.text(primary), source.text(secondary)) {
        (Some(first), Some(second)) => {
            let open = missing_or_na(&first);
            let filled = open.into_iter().filter(|hit| *hit == Some(true)).count();
            let merged = second.zip_with(&open, &first)?;
            source.set_typed(primary, &merged)?;
            debug!(primary, secondary, filled, "back-filled alternative source column");
            primary
        }
        (Some(_), None) => primary,
        (None, _) => secondary,
    };
    Ok((*resolved).to_string())
}
