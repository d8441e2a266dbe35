//! Structured mappings: concatenations, conditional assignments,
//! multi-column matches and arithmetic derivations.
//!
//! Each value mapping of a `Structured mapping` rule takes exactly one form,
//! chosen by [`StructuredForm::of`] in the order listed on the enum.

use std::collections::HashMap;
use std::sync::LazyLock;

use polars::prelude::{BooleanChunked, Float64Chunked, StringChunked, StringChunkedBuilder};
use regex::Regex;
use tracing::debug;
use uds_common::NA_LITERAL;
use uds_model::ValueMapping;

use crate::condition::Condition;
use crate::engine::EntryContext;
use crate::error::Result;
use crate::expr::Expression;
use crate::frame::{Frame, numeric_text};
use crate::lookup::ResponseLookup;
use crate::report::{GapReason, RunReport};

/// Form-block suffix of a date component such as `visitmo__a5d2`.
static FORM_SUFFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{1,2}([a-d]\d*(d2)?)$").expect("Invalid form suffix regex"));

/// Source value that forces the derived value to [`SENTINEL_OUTPUT`].
const SENTINEL_INPUT: f64 = 9999.0;
const SENTINEL_OUTPUT: i64 = 999;

/// Values joined by a concatenation.
const CONCAT_LIMIT: usize = 3;

/// The transformation a structured value mapping describes.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredForm<'a> {
    /// `paste(A, B, C)` in the target value.
    Concatenation(&'a str),
    /// `IF(` in the source value; the response levels hold the branches.
    Conditional,
    /// `a | b` or `a & b` in the source value.
    MultiColumn { value: &'a str, target: Option<&'a str> },
    /// An operator in the source value; the target value is the formula.
    Arithmetic(&'a str),
    Unsupported,
}

impl<'a> StructuredForm<'a> {
    pub fn of(mapping: &'a ValueMapping) -> Self {
        let source = mapping.source_value.as_deref().unwrap_or_default();
        let target = mapping.target_value.as_deref();

        if let Some(formula) = target.filter(|t| t.contains("paste(")) {
            Self::Concatenation(formula)
        } else if source.contains("IF(") {
            Self::Conditional
        } else if source.contains('|') || source.contains('&') {
            Self::MultiColumn {
                value: source,
                target,
            }
        } else if source.contains(['+', '-', '*', '/']) {
            target.map_or(Self::Unsupported, Self::Arithmetic)
        } else {
            Self::Unsupported
        }
    }
}

/// Apply one structured value mapping.
pub(crate) fn apply_structured(
    ctx: &EntryContext<'_>,
    mapping: &ValueMapping,
    levels: &ResponseLookup,
    source: &Frame,
    target: &mut Frame,
    report: &mut RunReport,
) -> Result<()> {
    match StructuredForm::of(mapping) {
        StructuredForm::Concatenation(formula) => concatenate(ctx, formula, source, target, report),
        StructuredForm::Conditional => assign_conditional(ctx, levels, source, target, report),
        StructuredForm::MultiColumn { value, target: output } => {
            match_columns(ctx, value, output, source, target, report)
        }
        StructuredForm::Arithmetic(formula) => derive(ctx, formula, source, target, report),
        StructuredForm::Unsupported => {
            let value = mapping.source_value.clone().unwrap_or_default();
            report.record_gap(ctx.gap(GapReason::UnsupportedForm(value)));
            Ok(())
        }
    }
}

/// Column names inside `paste(...)`.
pub fn paste_components(formula: &str) -> Vec<String> {
    formula
        .replace("paste(", "")
        .replace(')', "")
        .split(',')
        .map(|part| part.trim().to_lowercase())
        .filter(|part| part.chars().any(char::is_alphanumeric))
        .collect()
}

/// Form-date column standing in for a concatenation whose parts are absent.
pub fn form_date_column(component: &str) -> Option<String> {
    let captures = FORM_SUFFIX_REGEX.captures(component)?;
    let suffix = captures.get(1)?.as_str();
    if suffix.contains("d2") {
        Some("d2_form_dt".to_string())
    } else {
        Some(format!("{suffix}_form_dt"))
    }
}

fn concatenate(
    ctx: &EntryContext<'_>,
    formula: &str,
    source: &Frame,
    target: &mut Frame,
    report: &mut RunReport,
) -> Result<()> {
    let components = paste_components(formula);
    if !components.is_empty() && components.iter().all(|name| source.contains(name)) {
        let parts: Vec<StringChunked> = components
            .iter()
            .take(CONCAT_LIMIT)
            .filter_map(|name| source.text(name))
            .collect();
        let mut builder =
            StringChunkedBuilder::new(ctx.target_name.as_str().into(), source.height());
        for row in 0..source.height() {
            let pieces: Vec<&str> = parts
                .iter()
                .map(|values| values.get(row).unwrap_or(NA_LITERAL))
                .collect();
            builder.append_value(pieces.join("/"));
        }
        return target.set_column(&ctx.target_name, builder.finish());
    }

    let Some(fallback) = components.get(1).and_then(|name| form_date_column(name)) else {
        report.record_gap(ctx.gap(GapReason::UnsupportedForm(formula.to_string())));
        return Ok(());
    };
    match source.text(&fallback) {
        Some(values) => {
            debug!(variable = %ctx.target_name, column = %fallback, "using form date");
            target.set_column(&ctx.target_name, values)?;
        }
        None => report.record_gap(ctx.gap(GapReason::MissingColumn(fallback))),
    }
    Ok(())
}

fn assign_conditional(
    ctx: &EntryContext<'_>,
    levels: &ResponseLookup,
    source: &Frame,
    target: &mut Frame,
    report: &mut RunReport,
) -> Result<()> {
    let columns: Vec<&str> = ctx.source_name.split(" | ").collect();
    for (key, value) in levels.iter() {
        let condition = Condition::from_key(&columns, key);
        let Some(mask) = condition.evaluate(source) else {
            let missing = condition.missing_columns(source);
            report.record_gap(ctx.gap(GapReason::MissingColumns(missing)));
            continue;
        };
        target.assign(&ctx.target_name, &mask, value)?;
    }
    Ok(())
}

fn match_columns(
    ctx: &EntryContext<'_>,
    value: &str,
    output: Option<&str>,
    source: &Frame,
    target: &mut Frame,
    report: &mut RunReport,
) -> Result<()> {
    let Some(condition) = Condition::from_pair(&ctx.source_name, value) else {
        return Ok(());
    };
    let missing = condition.missing_columns(source);
    let Some(mask) = condition.evaluate(source).filter(|_| missing.is_empty()) else {
        report.record_gap(ctx.gap(GapReason::MissingColumns(missing)));
        return Ok(());
    };

    if target.contains(&ctx.target_name) {
        let written = output.and_then(numeric_text);
        let open = &mask & &target.null_mask(&ctx.target_name);
        target.assign(&ctx.target_name, &open, written.as_deref())
    } else {
        target.assign(&ctx.target_name, &mask, output)
    }
}

fn derive(
    ctx: &EntryContext<'_>,
    formula: &str,
    source: &Frame,
    target: &mut Frame,
    report: &mut RunReport,
) -> Result<()> {
    let Some(guard) = ctx.config.guard_for(&ctx.target_name) else {
        report.record_gap(ctx.gap(GapReason::NoGuard));
        return Ok(());
    };
    let Some(guard_values) = source.numbers(guard) else {
        report.record_gap(ctx.gap(GapReason::MissingColumn(guard.to_string())));
        return Ok(());
    };
    let guarded = guard_mask(&guard_values);
    if !guarded.any() {
        debug!(variable = %ctx.target_name, guard, "guard is zero on every row");
        return Ok(());
    }

    let expression = match Expression::parse(formula) {
        Ok(expression) => expression,
        Err(error) => {
            report.record_gap(ctx.gap(GapReason::MalformedExpression {
                expression: formula.to_string(),
                message: error.to_string(),
            }));
            return Ok(());
        }
    };
    let missing: Vec<String> = expression
        .columns()
        .into_iter()
        .filter(|name| !source.contains(name))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        report.record_gap(ctx.gap(GapReason::MissingColumns(missing)));
        return Ok(());
    }

    let operands: HashMap<&str, Float64Chunked> = expression
        .columns()
        .into_iter()
        .filter_map(|name| Some((name, source.numbers(name)?)))
        .collect();
    let subject = source.numbers(&ctx.source_name);

    // `None` leaves the row untouched; `Some(value)` writes it.
    let rows: Vec<Option<Option<String>>> = (0..source.height())
        .map(|row| {
            let subject_value = subject.as_ref().map(|values| values.get(row));
            if subject_value == Some(Some(SENTINEL_INPUT)) {
                return Some(Some(SENTINEL_OUTPUT.to_string()));
            }
            if guarded.get(row) != Some(true) || subject_value == Some(None) {
                return None;
            }
            let value = expression.evaluate(|name| {
                operands
                    .get(name)
                    .map(|values| values.get(row).unwrap_or(0.0))
            });
            Some(value.map(|v| (v.trunc() as i64).to_string()))
        })
        .collect();
    let mask: BooleanChunked = rows.iter().map(Option::is_some).collect();
    let values: StringChunked = rows.into_iter().map(Option::flatten).collect();
    target.overwrite(&ctx.target_name, &mask, &values)
}

/// Rows enabled by a guard column: non-null and not zero.
fn guard_mask(values: &Float64Chunked) -> BooleanChunked {
    values
        .into_iter()
        .map(|value| value.is_some_and(|v| v != 0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forms_are_exclusive_and_ordered() {
        let paste = ValueMapping::new(Some("a | b"), Some("paste(MO, DY, YR)"));
        assert!(matches!(StructuredForm::of(&paste), StructuredForm::Concatenation(_)));

        let conditional = ValueMapping::new(Some("IF(A | B)"), Some("1"));
        assert_eq!(StructuredForm::of(&conditional), StructuredForm::Conditional);

        let multi = ValueMapping::new(Some("1 & 0"), Some("2"));
        assert!(matches!(StructuredForm::of(&multi), StructuredForm::MultiColumn { .. }));

        let arithmetic = ValueMapping::new(Some("PDAGE + BIRTHYR"), Some("PDYR – BIRTHYR"));
        assert_eq!(
            StructuredForm::of(&arithmetic),
            StructuredForm::Arithmetic("PDYR – BIRTHYR")
        );

        let plain = ValueMapping::new(Some("1"), Some("2"));
        assert_eq!(StructuredForm::of(&plain), StructuredForm::Unsupported);
    }

    #[test]
    fn paste_components_keep_named_parts() {
        assert_eq!(
            paste_components("paste(VISITMO__A5D2, VISITDAY__A5D2, \"/\", VISITYR__A5D2)"),
            vec!["visitmo__a5d2", "visitday__a5d2", "visityr__a5d2"]
        );
    }

    #[test]
    fn form_date_fallbacks() {
        assert_eq!(form_date_column("visitday__a5d2").as_deref(), Some("d2_form_dt"));
        assert_eq!(form_date_column("visitday__b5").as_deref(), Some("b5_form_dt"));
        assert_eq!(form_date_column("visitday_c2").as_deref(), Some("c2_form_dt"));
        assert_eq!(form_date_column("visitday"), None);
    }

    #[test]
    fn guard_enables_only_non_zero_numbers() {
        let values: Float64Chunked = [Some(0.0), None, Some(2.0), Some(-1.0)]
            .into_iter()
            .collect();
        let enabled: Vec<Option<bool>> = guard_mask(&values).into_iter().collect();
        assert_eq!(enabled, vec![Some(false), Some(false), Some(true), Some(true)]);
    }
}
