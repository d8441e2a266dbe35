//! Conformity rules.
//!
//! A conformity rule lists the value sets each schema declares. When the
//! sets agree the column carries over unchanged (or is aggregated, or
//! expanded over a repeating group); when they differ the response levels
//! remap it.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use polars::prelude::{BooleanChunked, ChunkZip, Float64Chunked, StringChunked};
use regex::Regex;
use tracing::debug;
use uds_common::{format_numeric, parse_f64};
use uds_model::{RuleCategory, RuleKind, ValueMapping};

use crate::engine::{EntryContext, copy_column};
use crate::error::Result;
use crate::frame::{ColumnKind, Frame, text_matches};
use crate::lookup::{KeyForm, NULL_KEY, ResponseLookup};
use crate::repeating::expand_repeating;
use crate::report::{GapReason, RunReport};

/// Marker of a row-wise maximum in conformity notes.
const MAX_MARKER: &str = "MAX(";

static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("Invalid word regex"));

/// Source names whose multi-value keys are not applied.
const UNMAPPED_ALTERNATIVE_SUFFIXES: [&str; 2] = ["sec", "ter"];

/// Normalize a declared source value before comparing value sets.
///
/// `2 | 3` keeps its first segment and `Any value.` drops trailing periods.
pub fn normalize_conformity_value(value: &str) -> String {
    if let Some((first, _)) = value.split_once('|') {
        first.trim().to_string()
    } else if value.contains("Any") {
        value.trim_end_matches('.').to_string()
    } else {
        value.to_string()
    }
}

/// Whether the declared value sets of both schemas agree.
pub fn value_sets_match(values: &[&ValueMapping]) -> bool {
    let source: BTreeSet<Option<String>> = values
        .iter()
        .map(|value| value.source_value.as_deref().map(normalize_conformity_value))
        .collect();
    let target: BTreeSet<Option<String>> = values
        .iter()
        .map(|value| value.target_value.clone())
        .collect();
    source == target
}

/// Columns named after the `MAX(` marker of the first note carrying it.
pub fn max_columns<'v>(notes: impl IntoIterator<Item = &'v str>) -> Option<Vec<String>> {
    let note = notes.into_iter().find(|note| note.contains(MAX_MARKER))?;
    let (_, rest) = note.split_once(MAX_MARKER)?;
    Some(
        WORD_REGEX
            .find_iter(rest)
            .map(|word| word.as_str().to_lowercase())
            .collect(),
    )
}

pub(crate) fn apply_conformity(
    ctx: &EntryContext<'_>,
    levels: &ResponseLookup,
    source: &Frame,
    target: &mut Frame,
    report: &mut RunReport,
) -> Result<()> {
    let values: Vec<&ValueMapping> = ctx.entry.values_of(&RuleKind::Conformity).collect();
    let repeating = ctx.config.is_repeating_template(&ctx.source_name);

    if value_sets_match(&values) {
        debug!(variable = %ctx.target_name, "conformity values match");
        if repeating {
            report.repeating += expand_repeating(
                ctx.config,
                &ctx.source_name,
                &ctx.target_name,
                source,
                target,
                None,
            )?;
        } else if let Some(columns) = max_columns(values.iter().map(|value| value.note.as_str())) {
            row_max(ctx, &columns, source, target, report)?;
        } else if !copy_column(source, target, &ctx.source_name, &ctx.target_name)? {
            report.record_gap(ctx.gap(GapReason::MissingColumn(ctx.source_name.clone())));
        }
        return Ok(());
    }

    if repeating {
        report.repeating += expand_repeating(
            ctx.config,
            &ctx.source_name,
            &ctx.target_name,
            source,
            target,
            Some(levels),
        )?;
        return Ok(());
    }
    remap(ctx, levels, source, target, report)
}

fn row_max(
    ctx: &EntryContext<'_>,
    columns: &[String],
    source: &Frame,
    target: &mut Frame,
    report: &mut RunReport,
) -> Result<()> {
    let parts: Option<Vec<Float64Chunked>> =
        columns.iter().map(|name| source.numbers(name)).collect();
    let Some(parts) = parts.filter(|parts| !parts.is_empty()) else {
        let missing = columns
            .iter()
            .filter(|name| !source.contains(name))
            .cloned()
            .collect();
        report.record_gap(ctx.gap(GapReason::MissingColumns(missing)));
        return Ok(());
    };
    let maxima: StringChunked = (0..source.height())
        .map(|row| {
            parts
                .iter()
                .filter_map(|values| values.get(row))
                .reduce(f64::max)
                .map(format_numeric)
        })
        .collect();
    target.set_column(&ctx.target_name, maxima)
}

fn remap(
    ctx: &EntryContext<'_>,
    levels: &ResponseLookup,
    source: &Frame,
    target: &mut Frame,
    report: &mut RunReport,
) -> Result<()> {
    let Some(values) = source.text(&ctx.source_name) else {
        report.record_gap(ctx.gap(GapReason::MissingColumn(ctx.source_name.clone())));
        return Ok(());
    };
    let numbers = match source.kind(&ctx.source_name) {
        Some(ColumnKind::Int | ColumnKind::Float) => source.numbers(&ctx.source_name),
        _ => None,
    };
    let skip_alternatives = UNMAPPED_ALTERNATIVE_SUFFIXES
        .iter()
        .any(|suffix| ctx.source_name.ends_with(suffix));
    target.ensure_column(&ctx.target_name)?;

    for (key, value) in levels.iter() {
        let mask: BooleanChunked = match KeyForm::of(key) {
            KeyForm::Exact(NULL_KEY) => values.is_null(),
            KeyForm::Exact(key) => match (&numbers, parse_f64(key)) {
                (Some(numbers), Some(number)) => numbers
                    .into_iter()
                    .map(|cell| cell == Some(number))
                    .collect(),
                _ => text_matches(&values, key),
            },
            KeyForm::Alternatives(options) => {
                if skip_alternatives {
                    continue;
                }
                values
                    .into_iter()
                    .map(|cell| cell.is_some_and(|text| options.contains(&text)))
                    .collect()
            }
            // Text searches run after every other key.
            KeyForm::TextSearch(_) => continue,
        };
        target.assign(&ctx.target_name, &mask, value)?;
    }

    for (key, value) in levels.iter() {
        let KeyForm::TextSearch(term) = KeyForm::of(key) else {
            continue;
        };
        let Some(term) = term else {
            report.record_gap(ctx.gap(GapReason::MalformedExpression {
                expression: key.to_string(),
                message: "text search has no quoted term".to_string(),
            }));
            continue;
        };
        let mask: BooleanChunked = values
            .into_iter()
            .map(|cell| cell.is_some_and(|text| text.to_lowercase().contains(&term)))
            .collect();
        target.assign(&ctx.target_name, &mask, value)?;
    }

    let preserves = !matches!(
        ctx.category,
        RuleCategory::StructuredTransformation | RuleCategory::HighComplexity
    );
    if preserves && !levels.is_empty() && !levels.ends_with_text_search() {
        let Some(mapped) = target.text(&ctx.target_name) else {
            return Ok(());
        };
        let kept: BooleanChunked = mapped
            .into_iter()
            .map(|cell| levels.maps_to(cell))
            .collect();
        let merged = mapped.zip_with(&kept, &values)?;
        target.set_column(&ctx.target_name, merged)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_rules() {
        assert_eq!(normalize_conformity_value("2 | 3"), "2");
        assert_eq!(normalize_conformity_value("Any value..."), "Any value");
        assert_eq!(normalize_conformity_value("1."), "1.");
    }

    #[test]
    fn split_source_values_still_conform() {
        let values = [
            ValueMapping::new(Some("1"), Some("1")),
            ValueMapping::new(Some("2|3"), Some("2")),
        ];
        let refs: Vec<&ValueMapping> = values.iter().collect();
        assert!(value_sets_match(&refs));

        let differing = [ValueMapping::new(Some("1"), Some("0"))];
        let refs: Vec<&ValueMapping> = differing.iter().collect();
        assert!(!value_sets_match(&refs));
    }

    #[test]
    fn max_columns_follow_the_marker() {
        let notes = ["NA", "UDS4 = MAX(HRTATTMULT, HRTATTMULT2)"];
        assert_eq!(
            max_columns(notes),
            Some(vec!["hrtattmult".to_string(), "hrtattmult2".to_string()])
        );
        assert_eq!(max_columns(["plain note"]), None);
    }
}
