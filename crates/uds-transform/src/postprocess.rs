//! Post-processing of the migrated table.

use polars::prelude::StringChunked;
use tracing::debug;
use uds_common::NA_LITERAL;
use uds_model::CrosswalkConfig;

use crate::error::Result;
use crate::frame::Frame;

/// For every stop field present in the table, set its dependents to `NA`
/// on rows where the stop field is null. Dependents are created when absent.
pub fn propagate_stops(target: &mut Frame, config: &CrosswalkConfig) -> Result<()> {
    let present: Vec<String> = target
        .column_names()
        .filter(|name| config.stop_fields.contains_key(*name))
        .map(str::to_string)
        .collect();

    for name in present {
        let Some(dependents) = config.stop_fields.get(&name) else {
            continue;
        };
        let stopped = target.null_mask(&name);
        if !stopped.any() {
            continue;
        }
        debug!(variable = %name, dependents = dependents.len(), "propagating stop field");
        for dependent in dependents {
            target.assign(dependent, &stopped, Some(NA_LITERAL))?;
        }
    }
    Ok(())
}

/// Replace nulls and `<NA>` placeholders with the literal `NA`.
pub fn normalize_missing(target: &mut Frame) -> Result<()> {
    let names: Vec<String> = target.column_names().map(str::to_string).collect();
    for name in names {
        let Some(values) = target.text(&name) else {
            continue;
        };
        let normalized: StringChunked = values
            .into_iter()
            .map(|value| match value {
                None | Some("<NA>") => Some(NA_LITERAL),
                other => other,
            })
            .collect();
        target.set_column(&name, normalized)?;
    }
    Ok(())
}

/// Stop propagation, missing-value normalization, then projection onto the
/// recognized column order (lowercased; unknown columns dropped).
pub fn finalize(mut target: Frame, config: &CrosswalkConfig, order: &[String]) -> Result<Frame> {
    propagate_stops(&mut target, config)?;
    normalize_missing(&mut target)?;
    let order: Vec<String> = order.iter().map(|name| name.trim().to_lowercase()).collect();
    let finished = target.select(&order)?;
    debug!(columns = finished.width(), rows = finished.height(), "finalized table");
    Ok(finished)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(frame: &Frame, name: &str) -> Vec<String> {
        frame
            .text(name)
            .map(|values| {
                values
                    .into_iter()
                    .map(|value| value.unwrap_or("<null>").to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn placeholders_become_na() {
        let mut frame = Frame::new(4);
        let values: StringChunked = [None, Some("<NA>"), Some("NA"), Some("3")]
            .into_iter()
            .collect();
        frame.set_column("x", values).expect("column");
        normalize_missing(&mut frame).expect("normalize");
        assert_eq!(strings(&frame, "x"), vec!["NA", "NA", "NA", "3"]);
    }

    #[test]
    fn finalize_orders_and_drops() {
        let frame = Frame::from_text_columns(vec![
            ("b", vec![Some("1")]),
            ("a", vec![None]),
            ("extra", vec![Some("0")]),
        ])
        .expect("frame");
        let order = ["A".to_string(), "b".to_string(), "absent".to_string()];
        let finished = finalize(frame, &CrosswalkConfig::empty(), &order).expect("finalize");
        let names: Vec<&str> = finished.column_names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(strings(&finished, "a"), vec!["NA"]);
    }
}
