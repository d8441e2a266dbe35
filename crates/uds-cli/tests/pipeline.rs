//! Integration tests for the pipeline module.

use std::fs;
use std::path::Path;

use polars::prelude::{Column, DataFrame};

use uds_cli::pipeline::{
    compile_sheet, load_config, migrate_table, prepare_source, sheet_stem, write_output_csv,
};
use uds_model::{CrosswalkConfig, RuleCategory};
use uds_transform::{ColumnKind, Frame};

const SHEET: &str = "UDS3 Data Element,UDS4 Data Element,Mapping Type,UDS3 Value,UDS4 Value
NACCAGE,NACCAGE,Conformity,,
SEX,SEX4,Response LEVELS,1,male
SEX,SEX4,Response LEVELS,2,female
";

fn test_df(columns: Vec<(&str, Vec<Option<&str>>)>) -> DataFrame {
    let cols: Vec<Column> = columns
        .into_iter()
        .map(|(name, values)| Column::new(name.into(), values))
        .collect();
    DataFrame::new(cols).unwrap()
}

fn strings(frame: &Frame, name: &str) -> Vec<Option<String>> {
    frame
        .text(name)
        .unwrap()
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect()
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_compile_sheet_classifies_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "a1_crosswalk.csv", SHEET);

    let rules = compile_sheet(&path).unwrap();

    assert_eq!(rules.entries(RuleCategory::Direct).len(), 1);
    assert_eq!(rules.entries(RuleCategory::ConditionalConsistency).len(), 1);
    let sex = &rules.entries(RuleCategory::ConditionalConsistency)[0];
    assert_eq!(sex.target_variable, "SEX4");
    assert_eq!(sex.rules.len(), 2);
    assert_eq!(sheet_stem(&path), "a1_crosswalk");
}

#[test]
fn test_migrate_and_write_output() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = write(dir.path(), "a1.csv", SHEET);
    let rules = compile_sheet(&sheet).unwrap();
    let df = test_df(vec![
        ("naccage", vec![Some("70"), Some("NA")]),
        ("sex", vec![Some("1"), Some("2")]),
    ]);
    let order = vec!["NACCAGE".to_string(), "sex4".to_string(), "unknown".to_string()];

    let (frame, report) =
        migrate_table(&df, &[rules], &order, &CrosswalkConfig::default()).unwrap();

    assert_eq!(report.rule_sets, 1);
    assert_eq!(report.total_entries(), 2);
    assert!(report.gaps.is_empty());
    assert_eq!(frame.width(), 2);

    let output = dir.path().join("out").join("uds4.csv");
    write_output_csv(frame, &output).unwrap();
    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    assert_eq!(text, "naccage,sex4\n70,male\nNA,female\n");
}

#[test]
fn test_prepare_source_zero_pads_configured_columns() {
    let df = test_df(vec![
        ("momprdx", vec![Some("1"), None, Some("12")]),
        ("naccage", vec![Some("70"), Some("71"), None]),
    ]);

    let frame = prepare_source(&df, &CrosswalkConfig::default()).unwrap();

    assert_eq!(
        strings(&frame, "momprdx"),
        vec![Some("001".to_string()), Some("NA".to_string()), Some("012".to_string())]
    );
    assert_eq!(frame.kind("naccage"), Some(ColumnKind::Int));
    assert_eq!(
        strings(&frame, "naccage"),
        vec![Some("70".to_string()), Some("71".to_string()), None]
    );
}

#[test]
fn test_load_config_overrides_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "crosswalk.toml",
        "[zero_pad_columns]\nnaccid = 5\n",
    );

    let config = load_config(Some(&path)).unwrap();

    assert_eq!(config.zero_pad_columns.get("naccid"), Some(&5));
    assert!(!config.zero_pad_columns.contains_key("momprdx"));
    assert_eq!(config.renames, CrosswalkConfig::default().renames);
    assert_eq!(load_config(None).unwrap(), CrosswalkConfig::default());
}

#[test]
fn test_load_config_reports_bad_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "bad.toml", "zero_pad_columns = 3\n");

    let error = load_config(Some(&path)).unwrap_err();

    assert!(format!("{error:#}").contains("bad.toml"));
}
