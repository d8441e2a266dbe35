//! Transformation-class assignment for specification rows.
//!
//! Rows are grouped by target variable and every row in a group receives the
//! same [`RuleCategory`]. The rules are evaluated in a fixed priority order,
//! so a group whose flags disagree still resolves to exactly one class.

use std::collections::BTreeMap;

use tracing::debug;
use uds_model::{ClassifiedRow, RuleCategory, SpecRow, SpecialMapping};

/// Trailing character marking free-text variables (e.g. `PRIMLANX`).
pub const FREE_TEXT_MARKER: char = 'X';

/// Resolve the category of one target-variable group.
///
/// Returns [`RuleCategory::ConditionalConsistency`] for an empty group.
pub fn classify_group(rows: &[&SpecRow]) -> RuleCategory {
    let Some(first) = rows.first() else {
        return RuleCategory::ConditionalConsistency;
    };

    let free_text = rows.iter().all(|row| {
        row.target_variable.ends_with(FREE_TEXT_MARKER)
            && row.source_variable.ends_with(FREE_TEXT_MARKER)
            && row.type_change.is_no()
    });
    if free_text {
        return RuleCategory::Direct;
    }

    let tags: Vec<&SpecialMapping> = rows
        .iter()
        .filter_map(|row| row.special_mapping.as_ref())
        .collect();

    if tags.iter().any(|tag| tag.is_structural()) {
        RuleCategory::StructuredTransformation
    } else if tags.iter().any(|tag| **tag == SpecialMapping::Calculated) {
        RuleCategory::ConditionalConsistency
    } else if tags.is_empty() {
        if rows.iter().any(|row| row.reports_change()) {
            RuleCategory::ConditionalConsistency
        } else if first.source_variable == first.target_variable {
            RuleCategory::Direct
        } else {
            RuleCategory::ConditionalConsistency
        }
    } else {
        RuleCategory::HighComplexity
    }
}

/// Annotate every row with the category of its target-variable group.
///
/// Input row order is preserved.
pub fn classify_rows(rows: Vec<SpecRow>) -> Vec<ClassifiedRow> {
    let mut groups: BTreeMap<&str, Vec<&SpecRow>> = BTreeMap::new();
    for row in &rows {
        groups.entry(row.target_variable.as_str()).or_default().push(row);
    }

    let categories: BTreeMap<String, RuleCategory> = groups
        .into_iter()
        .map(|(target, group)| {
            let category = classify_group(&group);
            debug!(variable = target, rows = group.len(), %category, "classified group");
            (target.to_string(), category)
        })
        .collect();

    rows.into_iter()
        .map(|row| {
            let category = categories
                .get(&row.target_variable)
                .copied()
                .unwrap_or(RuleCategory::ConditionalConsistency);
            ClassifiedRow { row, category }
        })
        .collect()
}
