//! Crosswalk rule-set types.
//!
//! A [`RuleSet`] is the compiled, serializable form of a mapping specification.
//! Entries are bucketed into four [`RuleCategory`] lists, each entry pairs one
//! source variable with one target variable, and each entry carries the
//! ordered [`MappingRule`]s declared for that pair.
//!
//! The JSON field names are fixed by the rule-file format and round-trip
//! exactly, including the `crosswalk_remappings` key used by direct entries.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Default text for missing notes and reversibility flags.
pub const NOT_AVAILABLE: &str = "NA";

/// Transformation class assigned to a target variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    /// Straight copy or value lookup with no structural change.
    Direct,
    /// Value sets or types differ; conformity decides whether to remap.
    ConditionalConsistency,
    /// Formula, condition, merge or concatenation driven.
    StructuredTransformation,
    /// Tagged as special but not covered by the other classes.
    HighComplexity,
}

impl RuleCategory {
    /// Categories in the order the engine applies them.
    pub const ALL: [RuleCategory; 4] = [
        RuleCategory::Direct,
        RuleCategory::ConditionalConsistency,
        RuleCategory::StructuredTransformation,
        RuleCategory::HighComplexity,
    ];

    /// Key of this category's array in the rule-set document.
    pub fn key(self) -> &'static str {
        match self {
            Self::Direct => "Direct_Mappings",
            Self::ConditionalConsistency => "Conditional_Consistency",
            Self::StructuredTransformation => "Structured_Transformations",
            Self::HighComplexity => "High_Complexity",
        }
    }

    /// Human-readable label for summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::Direct => "Direct",
            Self::ConditionalConsistency => "Conditional consistency",
            Self::StructuredTransformation => "Structured transformation",
            Self::HighComplexity => "High complexity",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Semantic role of a [`MappingRule`].
///
/// Unknown mapping-type strings are kept verbatim so rule files round-trip;
/// the engine ignores them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleKind {
    /// `Response LEVELS`: value-to-value correspondences.
    ResponseLevels,
    /// `Conformity`: declared value sets compared between schemas.
    Conformity,
    /// `Structured mapping`: formula, condition or concatenation.
    StructuredMapping,
    /// Any other mapping-type text.
    Unrecognized(String),
}

impl RuleKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ResponseLevels => "Response LEVELS",
            Self::Conformity => "Conformity",
            Self::StructuredMapping => "Structured mapping",
            Self::Unrecognized(text) => text,
        }
    }

    /// Parse a mapping-type cell, matching the known kinds case-insensitively.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("Response LEVELS") {
            Self::ResponseLevels
        } else if trimmed.eq_ignore_ascii_case("Conformity") {
            Self::Conformity
        } else if trimmed.eq_ignore_ascii_case("Structured mapping") {
            Self::StructuredMapping
        } else {
            Self::Unrecognized(trimmed.to_string())
        }
    }
}

impl From<String> for RuleKind {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<RuleKind> for String {
    fn from(value: RuleKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete value correspondence between the schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMapping {
    /// Source-side value, condition or formula.
    #[serde(rename = "UDS3_value", default, deserialize_with = "loose_text::optional")]
    pub source_value: Option<String>,
    /// Target-side value or formula.
    #[serde(rename = "UDS4_value", default, deserialize_with = "loose_text::optional")]
    pub target_value: Option<String>,
    /// Whether the mapping can be reversed; `"NA"` when unknown.
    #[serde(default = "not_available", deserialize_with = "loose_text::required")]
    pub reversible: String,
    /// Curator notes; may carry markers such as `MAX(`.
    #[serde(default = "not_available", deserialize_with = "loose_text::required")]
    pub note: String,
}

impl ValueMapping {
    pub fn new(source_value: Option<&str>, target_value: Option<&str>) -> Self {
        Self {
            source_value: source_value.map(str::to_string),
            target_value: target_value.map(str::to_string),
            reversible: not_available(),
            note: not_available(),
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Value correspondences sharing a semantic role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    #[serde(rename = "mapping_type")]
    pub kind: RuleKind,
    #[serde(rename = "mappings", default)]
    pub values: Vec<ValueMapping>,
}

impl MappingRule {
    pub fn new(kind: RuleKind, values: Vec<ValueMapping>) -> Self {
        Self { kind, values }
    }
}

/// All rules for one (source variable, target variable) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(rename = "UDS3_variable")]
    pub source_variable: String,
    #[serde(rename = "UDS4_variable")]
    pub target_variable: String,
    #[serde(
        rename = "crosswalk_mappings",
        alias = "crosswalk_remappings",
        default
    )]
    pub rules: Vec<MappingRule>,
}

impl MappingEntry {
    pub fn new(
        source_variable: impl Into<String>,
        target_variable: impl Into<String>,
        rules: Vec<MappingRule>,
    ) -> Self {
        Self {
            source_variable: source_variable.into(),
            target_variable: target_variable.into(),
            rules,
        }
    }

    /// Rules of the given kind, in declaration order.
    pub fn rules_of<'a>(&'a self, kind: &'a RuleKind) -> impl Iterator<Item = &'a MappingRule> {
        self.rules.iter().filter(move |rule| &rule.kind == kind)
    }

    /// Value mappings of all rules of the given kind, in declaration order.
    pub fn values_of<'a>(&'a self, kind: &'a RuleKind) -> impl Iterator<Item = &'a ValueMapping> {
        self.rules_of(kind).flat_map(|rule| rule.values.iter())
    }

    pub fn has_kind(&self, kind: &RuleKind) -> bool {
        self.rules.iter().any(|rule| &rule.kind == kind)
    }
}

/// Compiled crosswalk: four ordered entry lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(
        rename = "Direct_Mappings",
        default,
        serialize_with = "serialize_direct"
    )]
    pub direct: Vec<MappingEntry>,
    #[serde(rename = "Conditional_Consistency", default)]
    pub conditional_consistency: Vec<MappingEntry>,
    #[serde(rename = "Structured_Transformations", default)]
    pub structured_transformations: Vec<MappingEntry>,
    #[serde(rename = "High_Complexity", default)]
    pub high_complexity: Vec<MappingEntry>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, category: RuleCategory) -> &[MappingEntry] {
        match category {
            RuleCategory::Direct => &self.direct,
            RuleCategory::ConditionalConsistency => &self.conditional_consistency,
            RuleCategory::StructuredTransformation => &self.structured_transformations,
            RuleCategory::HighComplexity => &self.high_complexity,
        }
    }

    pub fn push(&mut self, category: RuleCategory, entry: MappingEntry) {
        let list = match category {
            RuleCategory::Direct => &mut self.direct,
            RuleCategory::ConditionalConsistency => &mut self.conditional_consistency,
            RuleCategory::StructuredTransformation => &mut self.structured_transformations,
            RuleCategory::HighComplexity => &mut self.high_complexity,
        };
        list.push(entry);
    }

    /// Total number of entries across all categories.
    pub fn len(&self) -> usize {
        RuleCategory::ALL
            .iter()
            .map(|category| self.entries(*category).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Category holding an entry for the given target variable, if any.
    pub fn category_of(&self, target_variable: &str) -> Option<RuleCategory> {
        RuleCategory::ALL.into_iter().find(|category| {
            self.entries(*category)
                .iter()
                .any(|entry| entry.target_variable.eq_ignore_ascii_case(target_variable))
        })
    }
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Direct entries are written under `crosswalk_remappings`.
#[derive(Serialize)]
struct DirectEntry<'a> {
    #[serde(rename = "UDS3_variable")]
    source_variable: &'a str,
    #[serde(rename = "UDS4_variable")]
    target_variable: &'a str,
    #[serde(rename = "crosswalk_remappings")]
    rules: &'a [MappingRule],
}

#[allow(clippy::ptr_arg)]
fn serialize_direct<S>(entries: &Vec<MappingEntry>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(entries.iter().map(|entry| DirectEntry {
        source_variable: &entry.source_variable,
        target_variable: &entry.target_variable,
        rules: &entry.rules,
    }))
}

/// Deserializers accepting text, numbers, booleans or null as cell text.
mod loose_text {
    use std::fmt;

    use serde::Deserializer;
    use serde::de::{self, Visitor};

    use super::not_available;

    struct LooseText;

    impl<'de> Visitor<'de> for LooseText {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a string, number, boolean or null")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            if value.is_finite() && value.fract() == 0.0 {
                Ok(Some(format!("{}", value as i64)))
            } else {
                Ok(Some(value.to_string()))
            }
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(LooseText)
        }
    }

    pub(super) fn optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LooseText)
    }

    pub(super) fn required<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(deserializer
            .deserialize_any(LooseText)?
            .unwrap_or_else(not_available))
    }
}
