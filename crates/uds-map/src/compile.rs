//! Compilation of classified specification rows into a [`RuleSet`].

use std::collections::BTreeMap;

use tracing::{debug, info};
use uds_model::{
    ClassifiedRow, MappingEntry, MappingRule, NOT_AVAILABLE, RuleCategory, RuleSet, ValueMapping,
};

/// Workbook placeholder for an intentionally empty target value.
pub const BLANK_PLACEHOLDER: &str = "<BLANK>";

/// Spreadsheet carriage-return artifact left in exported cells.
const CARRIAGE_RETURN_ARTIFACT: &str = "_x000D_";

/// Remove workbook artifacts and surrounding whitespace.
///
/// # Examples
///
/// ```
/// use uds_map::clean_text;
///
/// assert_eq!(clean_text(" Yes_x000D_ "), "Yes");
/// assert_eq!(clean_text("a_x000D_b"), "ab");
/// ```
pub fn clean_text(value: &str) -> String {
    value.replace(CARRIAGE_RETURN_ARTIFACT, "").trim().to_string()
}

/// Build a rule set from classified rows.
///
/// Entries are keyed by (source, target) pair in sorted order; each row
/// becomes one rule in input order. Rows with a blank variable name are
/// dropped. The output depends only on the input rows.
pub fn compile_rule_set(rows: &[ClassifiedRow]) -> RuleSet {
    let mut groups: BTreeMap<(String, String), Vec<&ClassifiedRow>> = BTreeMap::new();
    let mut dropped = 0usize;
    for classified in rows {
        let source = clean_text(&classified.row.source_variable);
        let target = clean_text(&classified.row.target_variable);
        if source.is_empty() || target.is_empty() {
            dropped += 1;
            continue;
        }
        groups.entry((source, target)).or_default().push(classified);
    }
    if dropped > 0 {
        debug!(dropped, "skipped rows without a source or target variable");
    }

    let mut rule_set = RuleSet::new();
    for ((source, target), group) in groups {
        let category = group
            .first()
            .map(|classified| classified.category)
            .unwrap_or(RuleCategory::ConditionalConsistency);
        let rules = group.iter().copied().map(compile_rule).collect();
        rule_set.push(category, MappingEntry::new(source, target, rules));
    }

    info!(
        direct = rule_set.direct.len(),
        conditional = rule_set.conditional_consistency.len(),
        structured = rule_set.structured_transformations.len(),
        complex = rule_set.high_complexity.len(),
        "compiled rule set"
    );
    rule_set
}

fn compile_rule(classified: &ClassifiedRow) -> MappingRule {
    let row = &classified.row;
    let target_value = row.target_value.as_deref().map(|value| {
        let cleaned = clean_text(value);
        if cleaned == BLANK_PLACEHOLDER {
            String::new()
        } else {
            cleaned
        }
    });
    let value = ValueMapping {
        source_value: row.source_value.as_deref().map(clean_text),
        target_value,
        reversible: text_or_na(row.reversible.as_deref()),
        note: text_or_na(row.note.as_deref()),
    };
    MappingRule::new(row.mapping_type.clone(), vec![value])
}

fn text_or_na(value: Option<&str>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), clean_text)
}
