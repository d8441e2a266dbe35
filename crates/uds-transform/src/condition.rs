//! Boolean conditions across source columns.
//!
//! Conditions come from keys such as `1 | NA` paired with a source name such
//! as `cvhatt | hrtattmult`: the n-th operand tests the n-th column. Operands
//! `NA` and `None` test for a missing cell; anything else is an exact text
//! match against the rendered cell.

use polars::prelude::{BooleanChunked, ChunkFull, StringChunked};

use crate::frame::{Frame, missing_or_na, text_matches};

/// How clause results combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    /// `|`: any clause.
    Any,
    /// `&`: every clause.
    All,
}

impl Logic {
    fn separator(self) -> &'static str {
        match self {
            Self::Any => " | ",
            Self::All => " & ",
        }
    }

    /// `|` when the text contains one, else `&` when present.
    fn detect(text: &str) -> Option<Self> {
        if text.contains('|') {
            Some(Self::Any)
        } else if text.contains('&') {
            Some(Self::All)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Null or `NA` text.
    Missing,
    Equals(String),
}

impl Operand {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == "NA" || trimmed == "None" {
            Self::Missing
        } else {
            Self::Equals(trimmed.to_string())
        }
    }

    fn test(&self, values: &StringChunked) -> BooleanChunked {
        match self {
            Self::Missing => missing_or_na(values),
            Self::Equals(expected) => text_matches(values, expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub column: String,
    pub operand: Operand,
}

/// Clauses over named columns joined by one [`Logic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub logic: Logic,
    pub clauses: Vec<Clause>,
}

impl Condition {
    /// Pair a conditional key with pre-split columns.
    ///
    /// The key uses `|` when it contains one and `&` otherwise. Surplus
    /// columns or operands are ignored.
    pub fn from_key(columns: &[&str], key: &str) -> Self {
        let logic = if key.contains('|') {
            Logic::Any
        } else {
            Logic::All
        };
        let clauses = columns
            .iter()
            .zip(key.split(logic.separator()))
            .map(|(column, operand)| Clause {
                column: column.trim().to_string(),
                operand: Operand::parse(operand),
            })
            .collect();
        Self { logic, clauses }
    }

    /// Split a source name and a value on the separator found in the value.
    ///
    /// Returns `None` when the value holds no `|` or `&`.
    ///
    /// # Examples
    ///
    /// ```
    /// use uds_transform::{Condition, Logic};
    ///
    /// let condition = Condition::from_pair("cvhatt & hrtattmult", "1 & 0").unwrap();
    /// assert_eq!(condition.logic, Logic::All);
    /// assert_eq!(condition.clauses.len(), 2);
    /// ```
    pub fn from_pair(columns: &str, value: &str) -> Option<Self> {
        let logic = Logic::detect(value)?;
        let names: Vec<&str> = columns.split(logic.separator()).map(str::trim).collect();
        Some(Self::from_key(&names, value))
    }

    /// Referenced columns absent from the frame.
    pub fn missing_columns(&self, frame: &Frame) -> Vec<String> {
        self.clauses
            .iter()
            .filter(|clause| !frame.contains(&clause.column))
            .map(|clause| clause.column.clone())
            .collect()
    }

    /// Row mask, or `None` when a referenced column is absent.
    pub fn evaluate(&self, frame: &Frame) -> Option<BooleanChunked> {
        let initial = self.logic == Logic::All;
        let mut mask = BooleanChunked::full("mask".into(), initial, frame.height());
        for clause in &self.clauses {
            let values = frame.text(&clause.column)?;
            let hits = clause.operand.test(&values);
            mask = match self.logic {
                Logic::Any => &mask | &hits,
                Logic::All => &mask & &hits,
            };
        }
        Some(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::from_text_columns(vec![
            ("a", vec![Some("1"), Some("2"), None, Some("NA")]),
            ("b", vec![Some("x"), Some("y"), Some("x"), Some("z")]),
        ])
        .expect("frame")
    }

    fn bits(condition: &Condition) -> Option<Vec<bool>> {
        condition
            .evaluate(&frame())
            .map(|mask| mask.into_iter().map(|hit| hit == Some(true)).collect())
    }

    #[test]
    fn or_key_with_missing_operand() {
        let condition = Condition::from_key(&["a", "b"], "2 | NA");
        assert_eq!(condition.logic, Logic::Any);
        assert_eq!(
            bits(&condition),
            Some(vec![false, true, false, false])
        );
        let missing = Condition::from_key(&["a", "b"], "NA | none");
        // Column a is integer typed, so the NA text was read as null.
        assert_eq!(
            bits(&missing),
            Some(vec![false, false, true, true])
        );
    }

    #[test]
    fn and_key_requires_all() {
        let condition = Condition::from_key(&["a", "b"], "None & x");
        assert_eq!(
            bits(&condition),
            Some(vec![false, false, true, false])
        );
    }

    #[test]
    fn absent_column_yields_none() {
        let condition = Condition::from_key(&["a", "zz"], "1 & 2");
        assert_eq!(bits(&condition), None);
        assert_eq!(condition.missing_columns(&frame()), vec!["zz".to_string()]);
    }

    #[test]
    fn pair_without_separator_is_none() {
        assert!(Condition::from_pair("a", "1").is_none());
    }
}
