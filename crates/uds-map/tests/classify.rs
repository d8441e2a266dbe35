//! Tests for transformation-class assignment.

use proptest::prelude::*;
use uds_map::{classify_group, classify_rows};
use uds_model::{ChangeFlag, RuleCategory, RuleKind, SpecRow, SpecialMapping};

fn row(source: &str, target: &str) -> SpecRow {
    SpecRow::new(source, target, RuleKind::ResponseLevels)
}

fn tagged(source: &str, target: &str, tag: SpecialMapping) -> SpecRow {
    row(source, target).with_special_mapping(Some(tag))
}

#[test]
fn free_text_pairs_are_direct() {
    let a = row("OTHCONDX", "OTHCONDX").with_flags(ChangeFlag::No, ChangeFlag::Yes, ChangeFlag::Unset);
    let b = row("HISPORX", "HISPORX").with_flags(ChangeFlag::No, ChangeFlag::Unset, ChangeFlag::Yes);
    assert_eq!(classify_group(&[&a, &b]), RuleCategory::Direct);
}

#[test]
fn free_text_with_type_change_falls_through() {
    let a = row("OTHCONDX", "OTHCONDX").with_flags(ChangeFlag::Yes, ChangeFlag::Unset, ChangeFlag::Unset);
    assert_eq!(classify_group(&[&a]), RuleCategory::ConditionalConsistency);
}

#[test]
fn structural_tags_win_over_calculated() {
    for tag in [
        SpecialMapping::Structured,
        SpecialMapping::Merging,
        SpecialMapping::MergingCalculated,
    ] {
        let calc = tagged("PDYR", "PDAGE", SpecialMapping::Calculated);
        let structural = tagged("PDYR", "PDAGE", tag);
        assert_eq!(
            classify_group(&[&calc, &structural]),
            RuleCategory::StructuredTransformation
        );
    }
}

#[test]
fn calculated_tag_is_conditional() {
    let calc = tagged("BIRTHYR", "BIRTHAGE", SpecialMapping::Calculated);
    let other = tagged("BIRTHYR", "BIRTHAGE", SpecialMapping::Other("Lookup".to_string()));
    assert_eq!(
        classify_group(&[&other, &calc]),
        RuleCategory::ConditionalConsistency
    );
}

#[test]
fn untagged_groups_use_change_flags_then_names() {
    let changed = row("SEX", "SEX").with_flags(ChangeFlag::Unset, ChangeFlag::Yes, ChangeFlag::Unset);
    assert_eq!(classify_group(&[&changed]), RuleCategory::ConditionalConsistency);

    let same = row("SEX", "SEX").with_flags(ChangeFlag::No, ChangeFlag::No, ChangeFlag::No);
    assert_eq!(classify_group(&[&same]), RuleCategory::Direct);

    let renamed = row("DADPRDX", "DADPRDX4");
    assert_eq!(classify_group(&[&renamed]), RuleCategory::ConditionalConsistency);
}

#[test]
fn name_comparison_uses_first_row_verbatim() {
    let first = row("sex", "SEX");
    let second = row("SEX", "SEX");
    assert_eq!(
        classify_group(&[&first, &second]),
        RuleCategory::ConditionalConsistency
    );
    assert_eq!(classify_group(&[&second, &first]), RuleCategory::Direct);
}

#[test]
fn other_tags_are_high_complexity() {
    let other = tagged("CDRSUM", "CDRSUM", SpecialMapping::Other("Lookup".to_string()));
    let plain = row("CDRSUM", "CDRSUM");
    assert_eq!(classify_group(&[&plain, &other]), RuleCategory::HighComplexity);
}

#[test]
fn rows_inherit_group_category_in_input_order() {
    let rows = vec![
        row("A", "A"),
        tagged("B", "T", SpecialMapping::Structured),
        row("C", "T"),
        row("A", "A"),
    ];
    let classified = classify_rows(rows.clone());
    let categories: Vec<RuleCategory> = classified.iter().map(|c| c.category).collect();
    assert_eq!(
        categories,
        vec![
            RuleCategory::Direct,
            RuleCategory::StructuredTransformation,
            RuleCategory::StructuredTransformation,
            RuleCategory::Direct,
        ]
    );
    let order: Vec<SpecRow> = classified.into_iter().map(|c| c.row).collect();
    assert_eq!(order, rows);
}

fn flag() -> impl Strategy<Value = ChangeFlag> {
    prop_oneof![
        Just(ChangeFlag::Yes),
        Just(ChangeFlag::No),
        Just(ChangeFlag::Unset)
    ]
}

fn tag() -> impl Strategy<Value = Option<SpecialMapping>> {
    prop_oneof![
        Just(None),
        Just(Some(SpecialMapping::Structured)),
        Just(Some(SpecialMapping::Merging)),
        Just(Some(SpecialMapping::MergingCalculated)),
        Just(Some(SpecialMapping::Calculated)),
        Just(Some(SpecialMapping::Other("Lookup".to_string()))),
    ]
}

fn spec_row() -> impl Strategy<Value = SpecRow> {
    let names = prop::sample::select(vec!["SEX", "SEXX", "PDAGE", "OTHX", "RACE"]);
    (names.clone(), names, flag(), flag(), flag(), tag()).prop_map(
        |(source, target, type_change, conformity, form, tag)| {
            row(source, target)
                .with_flags(type_change, conformity, form)
                .with_special_mapping(tag)
        },
    )
}

proptest! {
    #[test]
    fn classification_is_deterministic(rows in prop::collection::vec(spec_row(), 0..24)) {
        let first = classify_rows(rows.clone());
        let second = classify_rows(rows.clone());
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), rows.len());

        for classified in &first {
            let group: Vec<&SpecRow> = rows
                .iter()
                .filter(|r| r.target_variable == classified.row.target_variable)
                .collect();
            prop_assert_eq!(classified.category, classify_group(&group));
        }
    }
}
