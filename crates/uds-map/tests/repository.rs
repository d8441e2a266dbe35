use std::fs;

use uds_map::RuleSetRepository;
use uds_map::repository::load_rule_set;
use uds_model::{MappingEntry, MappingRule, RuleCategory, RuleKind, RuleSet, ValueMapping};

fn sample_rules(target: &str) -> RuleSet {
    let mut rules = RuleSet::new();
    rules.push(
        RuleCategory::ConditionalConsistency,
        MappingEntry::new(
            "DADPRDX",
            target,
            vec![MappingRule::new(
                RuleKind::ResponseLevels,
                vec![ValueMapping::new(Some("1"), Some("yes"))],
            )],
        ),
    );
    rules
}

#[test]
fn repository_save_and_load() {
    let dir = tempfile::tempdir().expect("temp dir");
    let repo = RuleSetRepository::new(dir.path().join("rules")).expect("create repo");

    let rules = sample_rules("DADPRDX4");
    let path = repo.save("a3", &rules).expect("save rules");
    assert!(path.ends_with("a3_mappings.json"));

    let text = fs::read_to_string(&path).expect("read saved file");
    assert!(text.starts_with("{\n    \"Direct_Mappings\""));

    let loaded = load_rule_set(&path).expect("load rules");
    assert_eq!(loaded, rules);
}

#[test]
fn load_all_reads_json_in_name_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let repo = RuleSetRepository::new(dir.path()).expect("create repo");
    repo.save("b", &sample_rules("SECOND")).expect("save b");
    repo.save("a", &sample_rules("FIRST")).expect("save a");
    fs::write(dir.path().join("notes.txt"), "ignored").expect("write txt");
    fs::create_dir(dir.path().join("nested.json")).expect("create dir");

    let stored = repo.load_all().expect("load all");
    let names: Vec<&str> = stored.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a_mappings.json", "b_mappings.json"]);
    assert_eq!(
        stored[0].rules.conditional_consistency[0].target_variable,
        "FIRST"
    );
}

#[test]
fn open_requires_existing_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    assert!(RuleSetRepository::open(dir.path().join("missing")).is_err());
    let repo = RuleSetRepository::open(dir.path()).expect("open repo");
    assert!(repo.load_all().expect("load empty").is_empty());
}

#[test]
fn malformed_file_reports_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").expect("write file");
    let error = load_rule_set(&path).expect_err("parse failure");
    assert!(format!("{error:#}").contains("broken.json"));
}
