//! Run reports and recoverable gaps.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};
use uds_model::RuleCategory;

/// Why a rule could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapReason {
    /// A referenced source column is absent.
    MissingColumn(String),
    /// Some of several referenced source columns are absent.
    MissingColumns(Vec<String>),
    /// A formula or text-search key failed to parse.
    MalformedExpression { expression: String, message: String },
    /// An arithmetic derivation has no guard column configured.
    NoGuard,
    /// A structured value matched none of the supported forms.
    UnsupportedForm(String),
}

impl GapReason {
    fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedExpression { .. })
    }
}

impl fmt::Display for GapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn(column) => write!(f, "missing column {column}"),
            Self::MissingColumns(columns) => write!(f, "missing columns {}", columns.join(", ")),
            Self::MalformedExpression {
                expression,
                message,
            } => write!(f, "malformed expression '{expression}': {message}"),
            Self::NoGuard => f.write_str("no guard column configured"),
            Self::UnsupportedForm(value) => write!(f, "unsupported structured value '{value}'"),
        }
    }
}

/// A rule that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gap {
    pub category: RuleCategory,
    pub source_variable: String,
    pub target_variable: String,
    pub reason: GapReason,
}

/// Outcome of one repeating-group expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepeatOutcome {
    /// Derived source names checked.
    pub inspected: usize,
    /// Target columns written.
    pub written: usize,
}

impl std::ops::AddAssign for RepeatOutcome {
    fn add_assign(&mut self, other: Self) {
        self.inspected += other.inspected;
        self.written += other.written;
    }
}

/// Summary of a migration run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Rule sets applied.
    pub rule_sets: usize,
    /// Entries processed per category.
    pub entries: BTreeMap<RuleCategory, usize>,
    /// Rules skipped, in the order they were met.
    pub gaps: Vec<Gap>,
    /// Totals over every repeating-group expansion.
    pub repeating: RepeatOutcome,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_entry(&mut self, category: RuleCategory) {
        *self.entries.entry(category).or_default() += 1;
    }

    pub fn entries_in(&self, category: RuleCategory) -> usize {
        self.entries.get(&category).copied().unwrap_or(0)
    }

    pub fn total_entries(&self) -> usize {
        self.entries.values().sum()
    }

    /// Record a skipped rule, logging it.
    pub fn record_gap(&mut self, gap: Gap) {
        if gap.reason.is_malformed() {
            warn!(
                category = %gap.category,
                source = %gap.source_variable,
                variable = %gap.target_variable,
                reason = %gap.reason,
                "skipped rule"
            );
        } else {
            debug!(
                category = %gap.category,
                source = %gap.source_variable,
                variable = %gap.target_variable,
                reason = %gap.reason,
                "skipped rule"
            );
        }
        self.gaps.push(gap);
    }

    /// Gaps grouped by category.
    pub fn gaps_by_category(&self) -> BTreeMap<RuleCategory, usize> {
        let mut counts = BTreeMap::new();
        for gap in &self.gaps {
            *counts.entry(gap.category).or_default() += 1;
        }
        counts
    }
}
