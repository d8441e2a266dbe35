//! Rule application.
//!
//! [`CrosswalkEngine`] walks a [`RuleSet`] category by category and entry by
//! entry, dispatching each entry to one pass by the rule kinds it carries.
//! Passes only fill null target cells unless they are one of the explicit
//! overwrites (arithmetic, concatenation, conditional assignment, conformity
//! remap, row maximum, repeating groups).

use polars::prelude::BooleanChunked;
use tracing::{debug, info};
use uds_model::{CrosswalkConfig, MappingEntry, RuleCategory, RuleKind, RuleSet};

use crate::conformity::apply_conformity;
use crate::error::Result;
use crate::frame::{Frame, text_matches};
use crate::lookup::ResponseLookup;
use crate::report::{Gap, GapReason, RunReport};
use crate::resolve::{resolve_alternatives, resolve_source_name};
use crate::structured::apply_structured;

/// Applies compiled rule sets to a source table.
#[derive(Debug, Clone, Copy)]
pub struct CrosswalkEngine<'a> {
    config: &'a CrosswalkConfig,
}

impl<'a> CrosswalkEngine<'a> {
    pub fn new(config: &'a CrosswalkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a CrosswalkConfig {
        self.config
    }

    /// Run every rule set in order against `source`, building a new target.
    ///
    /// The source may be modified where two-candidate source names are
    /// back-filled. Rules that cannot apply are recorded as gaps; only
    /// DataFrame failures are returned as errors.
    pub fn migrate(&self, rule_sets: &[RuleSet], source: &mut Frame) -> Result<(Frame, RunReport)> {
        let mut target = Frame::new(source.height());
        let mut report = RunReport::new();
        for rules in rule_sets {
            self.apply(rules, source, &mut target, &mut report)?;
        }
        Ok((target, report))
    }

    /// Apply one rule set, all four categories in order.
    pub fn apply(
        &self,
        rules: &RuleSet,
        source: &mut Frame,
        target: &mut Frame,
        report: &mut RunReport,
    ) -> Result<()> {
        report.rule_sets += 1;
        for category in RuleCategory::ALL {
            let entries = rules.entries(category);
            info!(category = %category, entries = entries.len(), "applying rules");
            for entry in entries {
                report.count_entry(category);
                self.apply_entry(category, entry, source, target, report)?;
            }
        }
        Ok(())
    }

    fn apply_entry(
        &self,
        category: RuleCategory,
        entry: &MappingEntry,
        source: &mut Frame,
        target: &mut Frame,
        report: &mut RunReport,
    ) -> Result<()> {
        let has_levels = entry.has_kind(&RuleKind::ResponseLevels);
        let has_conformity = entry.has_kind(&RuleKind::Conformity);
        let has_structured = entry.has_kind(&RuleKind::StructuredMapping);

        let mut source_name = resolve_source_name(self.config, &entry.source_variable);
        if source_name.contains('|') && !has_structured {
            source_name = resolve_alternatives(source, &source_name)?;
        }
        let ctx = EntryContext {
            config: self.config,
            category,
            entry,
            source_name,
            target_name: entry.target_variable.trim().to_lowercase(),
        };
        let source: &Frame = source;
        let levels = ResponseLookup::from_values(entry.values_of(&RuleKind::ResponseLevels));
        debug!(
            category = %category,
            source = %ctx.source_name,
            variable = %ctx.target_name,
            levels = levels.len(),
            "applying entry"
        );

        if has_levels && !has_conformity && source.contains(&ctx.source_name) {
            apply_levels(&ctx, &levels, source, target)?;
        } else if has_structured {
            for mapping in entry.values_of(&RuleKind::StructuredMapping) {
                apply_structured(&ctx, mapping, &levels, source, target, report)?;
            }
        } else if !has_levels && category != RuleCategory::StructuredTransformation {
            if !copy_column(source, target, &ctx.source_name, &ctx.target_name)? {
                report.record_gap(ctx.gap(GapReason::MissingColumn(ctx.source_name.clone())));
            }
        } else if has_conformity {
            apply_conformity(&ctx, &levels, source, target, report)?;
        } else if has_levels {
            report.record_gap(ctx.gap(GapReason::MissingColumn(ctx.source_name.clone())));
        }
        Ok(())
    }
}

/// Names and settings shared by the passes applied to one entry.
pub(crate) struct EntryContext<'a> {
    pub config: &'a CrosswalkConfig,
    pub category: RuleCategory,
    pub entry: &'a MappingEntry,
    /// Lowercased, renamed and resolved source column.
    pub source_name: String,
    /// Lowercased target column.
    pub target_name: String,
}

impl EntryContext<'_> {
    pub fn gap(&self, reason: GapReason) -> Gap {
        Gap {
            category: self.category,
            source_variable: self.source_name.clone(),
            target_variable: self.target_name.clone(),
            reason,
        }
    }
}

/// Copy a column as text, filling only null cells when the target already
/// exists.
///
/// Returns false when the source column is absent.
pub(crate) fn copy_column(
    source: &Frame,
    target: &mut Frame,
    source_name: &str,
    target_name: &str,
) -> Result<bool> {
    let Some(values) = source.text(source_name) else {
        return Ok(false);
    };
    target.fill_nulls(target_name, values)?;
    Ok(true)
}

/// Response levels with no conformity rule: single-value keys fill the
/// target where it is still null.
fn apply_levels(
    ctx: &EntryContext<'_>,
    levels: &ResponseLookup,
    source: &Frame,
    target: &mut Frame,
) -> Result<()> {
    let Some(values) = source.text(&ctx.source_name) else {
        return Ok(());
    };
    target.ensure_column(&ctx.target_name)?;
    for (key, value) in levels.exact() {
        let open = target.null_mask(&ctx.target_name);
        let mask: BooleanChunked = &text_matches(&values, key) & &open;
        target.assign(&ctx.target_name, &mask, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uds_model::{MappingRule, ValueMapping};

    fn strings(frame: &Frame, name: &str) -> Vec<Option<String>> {
        frame
            .text(name)
            .map(|values| {
                values
                    .into_iter()
                    .map(|value| value.map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn copy_fills_only_nulls_of_existing_target() {
        let source =
            Frame::from_text_columns(vec![("a", vec![Some("1"), Some("2")])]).expect("frame");
        let mut target =
            Frame::from_text_columns(vec![("b", vec![Some("kept"), None])]).expect("frame");

        assert!(copy_column(&source, &mut target, "a", "b").expect("copy"));
        assert_eq!(
            strings(&target, "b"),
            vec![Some("kept".to_string()), Some("2".to_string())]
        );
        assert!(!copy_column(&source, &mut target, "missing", "b").expect("copy"));
    }

    #[test]
    fn levels_skip_multi_value_keys() {
        let config = CrosswalkConfig::empty();
        let entry = MappingEntry::new(
            "RACE",
            "RACE",
            vec![MappingRule::new(
                RuleKind::ResponseLevels,
                vec![
                    ValueMapping::new(Some("1"), Some("white")),
                    ValueMapping::new(Some("2 | 3"), Some("other")),
                ],
            )],
        );
        let mut rules = RuleSet::new();
        rules.push(RuleCategory::Direct, entry);
        let mut source =
            Frame::from_text_columns(vec![("race", vec![Some("1"), Some("2")])]).expect("frame");

        let (target, report) = CrosswalkEngine::new(&config)
            .migrate(&[rules], &mut source)
            .expect("migrate");

        assert_eq!(strings(&target, "race"), vec![Some("white".to_string()), None]);
        assert_eq!(report.rule_sets, 1);
        assert_eq!(report.entries_in(RuleCategory::Direct), 1);
        assert!(report.gaps.is_empty());
    }
}
