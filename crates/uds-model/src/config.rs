//! Run configuration for the crosswalk engine.
//!
//! The tables here are fixed for a migration run. [`CrosswalkConfig::default`]
//! carries the built-in UDS3 to UDS4 tables; a TOML file may replace any of
//! them, and tables it omits keep their built-in values.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Form codes whose header fields are renamed onto shared source columns.
const FORM_CODES: &[(char, &[u8])] = &[
    ('a', &[1, 2, 3, 4, 5]),
    ('b', &[1, 4, 5, 6, 7, 8, 9]),
    ('c', &[2]),
    ('d', &[1, 2]),
];

/// A family of indexed variables, e.g. `kid1yob` .. `kid15yob`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatingFamily {
    /// Role token found in the variable name (`kid`, `sib`).
    pub token: String,
    /// Highest member index; members are numbered from 1.
    pub max_index: usize,
}

impl RepeatingFamily {
    pub fn new(token: impl Into<String>, max_index: usize) -> Self {
        Self {
            token: token.into(),
            max_index,
        }
    }
}

/// Immutable configuration tables consumed by the engine and post-processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrosswalkConfig {
    /// Source variable templates handled by the repeating-group expander.
    pub repeating_templates: Vec<String>,
    /// Source alias -> canonical source column.
    pub renames: BTreeMap<String, String>,
    /// Target variable -> dependents forced to `NA` where it is null.
    pub stop_fields: BTreeMap<String, Vec<String>>,
    /// Derived target variable -> guard column that must be non-zero.
    pub arithmetic_guards: BTreeMap<String, String>,
    /// Source columns rendered as zero-padded integers before migration.
    pub zero_pad_columns: BTreeMap<String, usize>,
    /// Families recognized by the repeating-group expander.
    pub repeating_families: Vec<RepeatingFamily>,
}

impl Default for CrosswalkConfig {
    fn default() -> Self {
        Self {
            repeating_templates: ["sib###yob", "sib###agd", "sib###pdx"]
                .into_iter()
                .chain(["kid###yob", "kid###agd", "kid###pdx"])
                .map(str::to_string)
                .collect(),
            renames: default_renames(),
            stop_fields: default_stop_fields(),
            arithmetic_guards: [
                ("hrtattage", "cvhatt"),
                ("strokage", "cbstroke"),
                ("pdage", "pd"),
                ("lasttbi", "tbi"),
                ("pdothrage", "pdothr"),
                ("tiaage", "cbtia"),
            ]
            .into_iter()
            .map(|(target, guard)| (target.to_string(), guard.to_string()))
            .collect(),
            zero_pad_columns: [("momprdx".to_string(), 3), ("dadprdx".to_string(), 3)]
                .into_iter()
                .collect(),
            repeating_families: vec![
                RepeatingFamily::new("kid", 15),
                RepeatingFamily::new("sib", 20),
            ],
        }
    }
}

impl CrosswalkConfig {
    /// Configuration with every table empty.
    pub fn empty() -> Self {
        Self {
            repeating_templates: Vec::new(),
            renames: BTreeMap::new(),
            stop_fields: BTreeMap::new(),
            arithmetic_guards: BTreeMap::new(),
            zero_pad_columns: BTreeMap::new(),
            repeating_families: Vec::new(),
        }
    }

    /// Parse a TOML document; omitted tables keep their built-in values.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| ModelError::Config {
            path: origin.to_path_buf(),
            source: Box::new(source),
        })
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text, path)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Canonical source column for a (lowercased) source name.
    pub fn resolve_source<'a>(&'a self, name: &'a str) -> &'a str {
        self.renames.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn is_repeating_template(&self, name: &str) -> bool {
        self.repeating_templates.iter().any(|template| template == name)
    }

    /// First family whose token occurs in the name.
    pub fn family_for(&self, name: &str) -> Option<&RepeatingFamily> {
        self.repeating_families
            .iter()
            .filter_map(|family| name.find(&family.token).map(|pos| (pos, family)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, family)| family)
    }

    /// Guard column for a derived target variable.
    pub fn guard_for(&self, target: &str) -> Option<&str> {
        self.arithmetic_guards.get(target).map(String::as_str)
    }
}

fn default_renames() -> BTreeMap<String, String> {
    let mut renames = BTreeMap::new();
    for (category, numbers) in FORM_CODES {
        for number in *numbers {
            let form = format!("{category}{number}");
            let suffix = format!("__{form}");
            renames.insert(format!("ptid{suffix}"), "adc_sub_id".to_string());
            renames.insert(format!("formver{suffix}"), "form_ver_num".to_string());
            renames.insert(format!("adcid{suffix}"), "adc_cntr_id".to_string());
            renames.insert(format!("visitnum{suffix}"), format!("{form}_visit_day"));
            renames.insert(format!("initials{suffix}"), format!("{form}_ex_ini"));
        }
    }
    renames
}

fn default_stop_fields() -> BTreeMap<String, Vec<String>> {
    let mut stops = BTreeMap::new();
    stops.insert(
        "mometpr".to_string(),
        vec!["mommeval".to_string(), "momageo".to_string()],
    );
    stops.insert(
        "dadetpr".to_string(),
        vec!["dadmeval".to_string(), "dadageo".to_string()],
    );
    for (token, max) in [("kid", 15), ("sib", 20)] {
        for i in 1..=max {
            stops.insert(
                format!("{token}{i}etpr"),
                vec![format!("{token}{i}meval"), format!("{token}{i}age")],
            );
        }
    }
    stops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_renames_cover_form_headers() {
        let config = CrosswalkConfig::default();
        assert_eq!(config.resolve_source("ptid__a1"), "adc_sub_id");
        assert_eq!(config.resolve_source("visitnum__b4"), "b4_visit_day");
        assert_eq!(config.resolve_source("initials__d2"), "d2_ex_ini");
        assert_eq!(config.resolve_source("ptid__b2"), "ptid__b2");
        assert_eq!(config.renames.len(), 15 * 5);
    }

    #[test]
    fn builtin_stop_fields() {
        let config = CrosswalkConfig::default();
        assert_eq!(config.stop_fields.len(), 2 + 15 + 20);
        assert_eq!(
            config.stop_fields.get("kid15etpr"),
            Some(&vec!["kid15meval".to_string(), "kid15age".to_string()])
        );
    }

    #[test]
    fn family_lookup_prefers_earliest_token() {
        let config = CrosswalkConfig::default();
        assert_eq!(config.family_for("sib###yob").map(|f| f.max_index), Some(20));
        assert_eq!(config.family_for("kid###agd").map(|f| f.max_index), Some(15));
        assert!(config.family_for("momyob").is_none());
    }
}
