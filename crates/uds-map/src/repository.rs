//! Rule-set repository for persisting and reloading compiled crosswalks.
//!
//! Rule sets are stored as JSON files named `{stem}_mappings.json`, written
//! with four-space indentation so regenerated files diff cleanly against the
//! curated ones. Loading accepts any `.json` file in the directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use uds_model::RuleSet;

/// Suffix appended to the input stem when saving.
const FILE_SUFFIX: &str = "_mappings.json";

/// Repository for storing and retrieving compiled rule sets.
#[derive(Debug, Clone)]
pub struct RuleSetRepository {
    /// Directory holding the rule-set files.
    base_dir: PathBuf,
}

/// A rule set together with the file it was read from.
#[derive(Debug, Clone)]
pub struct StoredRuleSet {
    /// File name without directory.
    pub name: String,
    /// Full path of the source file.
    pub path: PathBuf,
    /// The parsed rules.
    pub rules: RuleSet,
}

impl RuleSetRepository {
    /// Create a repository at the given directory, creating it if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).with_context(|| {
            format!(
                "Failed to create rule-set repository: {}",
                base_dir.display()
            )
        })?;
        Ok(Self { base_dir })
    }

    /// Open an existing repository directory.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        if !base_dir.is_dir() {
            anyhow::bail!("rule-set directory not found: {}", base_dir.display());
        }
        Ok(Self { base_dir })
    }

    /// Save a rule set as `{stem}_mappings.json`.
    pub fn save(&self, stem: &str, rules: &RuleSet) -> Result<PathBuf> {
        let path = self.base_dir.join(format!("{stem}{FILE_SUFFIX}"));
        let json = to_json_string(rules)
            .with_context(|| format!("Failed to serialize rule set for {stem}"))?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write rule set to {}", path.display()))?;
        debug!(path = %path.display(), entries = rules.len(), "saved rule set");
        Ok(path)
    }

    /// List the `.json` files in the repository, sorted by file name.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.base_dir).with_context(|| {
            format!(
                "Failed to read rule-set repository: {}",
                self.base_dir.display()
            )
        })? {
            let path = entry?.path();
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if path.is_file() && is_json {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Load every rule set in the repository, in file-name order.
    pub fn load_all(&self) -> Result<Vec<StoredRuleSet>> {
        self.list()?
            .into_iter()
            .map(|path| {
                let rules = load_rule_set(&path)?;
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                Ok(StoredRuleSet { name, path, rules })
            })
            .collect()
    }
}

/// Read and parse a single rule-set file.
pub fn load_rule_set(path: &Path) -> Result<RuleSet> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule set from {}", path.display()))?;
    let rules: RuleSet = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse rule set from {}", path.display()))?;
    Ok(rules)
}

/// Serialize a rule set with four-space indentation.
pub fn to_json_string(rules: &RuleSet) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    rules.serialize(&mut serializer)?;
    Ok(String::from_utf8(buffer)?)
}
