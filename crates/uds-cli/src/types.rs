use std::collections::BTreeMap;
use std::path::PathBuf;

use uds_model::RuleCategory;
use uds_transform::RunReport;

#[derive(Debug)]
pub struct MigrationResult {
    pub source: PathBuf,
    pub output: PathBuf,
    pub rule_files: Vec<RuleFileSummary>,
    pub report: RunReport,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug)]
pub struct RuleFileSummary {
    pub name: String,
    pub entries: usize,
}

#[derive(Debug, Default)]
pub struct CompileResult {
    pub sheets: Vec<CompiledSheet>,
    pub errors: Vec<String>,
    pub has_errors: bool,
}

#[derive(Debug)]
pub struct CompiledSheet {
    pub input: PathBuf,
    pub output: PathBuf,
    pub entries: BTreeMap<RuleCategory, usize>,
}
