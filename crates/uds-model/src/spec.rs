//! Mapping-specification rows as curated in the crosswalk workbook.

use serde::{Deserialize, Serialize};

use crate::mapping::{RuleCategory, RuleKind};

/// Yes/No metadata flag; anything other than yes or no is unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeFlag {
    Yes,
    No,
    #[default]
    Unset,
}

impl ChangeFlag {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("yes") {
            Self::Yes
        } else if trimmed.eq_ignore_ascii_case("no") {
            Self::No
        } else {
            Self::Unset
        }
    }

    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }

    pub fn is_no(self) -> bool {
        self == Self::No
    }
}

/// The `special mapping` tag of a specification row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialMapping {
    Structured,
    Merging,
    /// `Merging; Calculated field`
    MergingCalculated,
    /// `Calculated field`
    Calculated,
    /// Any other non-empty tag.
    Other(String),
}

impl SpecialMapping {
    /// Parse a tag cell; blank cells carry no tag.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let tag = if trimmed.eq_ignore_ascii_case("Structured") {
            Self::Structured
        } else if trimmed.eq_ignore_ascii_case("Merging") {
            Self::Merging
        } else if trimmed.eq_ignore_ascii_case("Merging; Calculated field") {
            Self::MergingCalculated
        } else if trimmed.eq_ignore_ascii_case("Calculated field") {
            Self::Calculated
        } else {
            Self::Other(trimmed.to_string())
        };
        Some(tag)
    }

    /// Tags that route a group to structured transformation.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Structured | Self::Merging | Self::MergingCalculated
        )
    }
}

/// One row of the mapping specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRow {
    pub source_variable: String,
    pub target_variable: String,
    pub mapping_type: RuleKind,
    pub source_value: Option<String>,
    pub target_value: Option<String>,
    pub reversible: Option<String>,
    pub note: Option<String>,
    pub type_change: ChangeFlag,
    pub conformity_change: ChangeFlag,
    pub form_change: ChangeFlag,
    pub special_mapping: Option<SpecialMapping>,
}

impl SpecRow {
    /// A row with no values, notes or flags set.
    pub fn new(
        source_variable: impl Into<String>,
        target_variable: impl Into<String>,
        mapping_type: RuleKind,
    ) -> Self {
        Self {
            source_variable: source_variable.into(),
            target_variable: target_variable.into(),
            mapping_type,
            source_value: None,
            target_value: None,
            reversible: None,
            note: None,
            type_change: ChangeFlag::Unset,
            conformity_change: ChangeFlag::Unset,
            form_change: ChangeFlag::Unset,
            special_mapping: None,
        }
    }

    #[must_use]
    pub fn with_values(mut self, source: Option<&str>, target: Option<&str>) -> Self {
        self.source_value = source.map(str::to_string);
        self.target_value = target.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, type_change: ChangeFlag, conformity: ChangeFlag, form: ChangeFlag) -> Self {
        self.type_change = type_change;
        self.conformity_change = conformity;
        self.form_change = form;
        self
    }

    #[must_use]
    pub fn with_special_mapping(mut self, tag: Option<SpecialMapping>) -> Self {
        self.special_mapping = tag;
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// True if any of the type, conformity or form flags reports a change.
    pub fn reports_change(&self) -> bool {
        self.type_change.is_yes() || self.conformity_change.is_yes() || self.form_change.is_yes()
    }
}

/// A specification row annotated with its group's category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRow {
    pub row: SpecRow,
    pub category: RuleCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse_case_insensitively() {
        assert_eq!(ChangeFlag::parse("YES"), ChangeFlag::Yes);
        assert_eq!(ChangeFlag::parse(" no"), ChangeFlag::No);
        assert_eq!(ChangeFlag::parse("maybe"), ChangeFlag::Unset);
        assert_eq!(ChangeFlag::parse(""), ChangeFlag::Unset);
    }

    #[test]
    fn special_mapping_tags() {
        assert_eq!(SpecialMapping::parse(""), None);
        assert_eq!(
            SpecialMapping::parse("Merging; Calculated field"),
            Some(SpecialMapping::MergingCalculated)
        );
        assert!(SpecialMapping::parse("Structured").is_some_and(|t| t.is_structural()));
        assert!(!SpecialMapping::parse("Calculated field").is_some_and(|t| t.is_structural()));
        assert_eq!(
            SpecialMapping::parse("Lookup"),
            Some(SpecialMapping::Other("Lookup".to_string()))
        );
    }
}
