//! Response-level lookup tables.

use std::sync::LazyLock;

use regex::Regex;
use uds_model::ValueMapping;

/// Key text standing for a null source value.
pub const NULL_KEY: &str = "None";

/// `grep("term", COLUMN)` text-search marker.
static TEXT_SEARCH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"grep\("(.*?)","#).expect("Invalid text-search regex"));

/// How a lookup key matches source cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyForm<'a> {
    /// A single value.
    Exact(&'a str),
    /// `1 | 3 | 5`: membership in the alternatives.
    Alternatives(Vec<&'a str>),
    /// `grep("term", COLUMN)`: case-insensitive containment of the term.
    TextSearch(Option<String>),
}

impl<'a> KeyForm<'a> {
    pub fn of(key: &'a str) -> Self {
        if key.contains("grep(") {
            let term = TEXT_SEARCH_REGEX
                .captures(key)
                .and_then(|captures| captures.get(1))
                .map(|term| term.as_str().to_lowercase());
            Self::TextSearch(term)
        } else if key.contains('|') {
            Self::Alternatives(key.split(" | ").map(str::trim).collect())
        } else {
            Self::Exact(key)
        }
    }
}

/// Ordered source-value to target-value table.
///
/// A null source value is keyed as `None`. When a key repeats, the last
/// target value wins and the key keeps its first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseLookup {
    entries: Vec<(String, Option<String>)>,
}

impl ResponseLookup {
    pub fn from_values<'v>(values: impl IntoIterator<Item = &'v ValueMapping>) -> Self {
        let mut lookup = Self::default();
        for value in values {
            let key = value.source_value.as_deref().unwrap_or(NULL_KEY);
            lookup.insert(key, value.target_value.clone());
        }
        lookup
    }

    fn insert(&mut self, key: &str, target: Option<String>) {
        match self.entries.iter_mut().find(|(existing, _)| existing == key) {
            Some(entry) => entry.1 = target,
            None => self.entries.push((key.to_string(), target)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(key, target)| (key.as_str(), target.as_deref()))
    }

    /// Entries whose key is a single value.
    pub fn exact(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.iter()
            .filter(|(key, _)| matches!(KeyForm::of(key), KeyForm::Exact(_)))
    }

    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, target)| target)
    }

    /// True when the value equals one of the mapped outputs.
    pub fn maps_to(&self, value: Option<&str>) -> bool {
        self.entries
            .iter()
            .any(|(_, target)| target.as_deref() == value)
    }

    /// True when the last key is a text search.
    pub fn ends_with_text_search(&self) -> bool {
        self.entries
            .last()
            .is_some_and(|(key, _)| matches!(KeyForm::of(key), KeyForm::TextSearch(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_duplicates_override_in_place() {
        let values = [
            ValueMapping::new(Some("1"), Some("a")),
            ValueMapping::new(None, Some("n")),
            ValueMapping::new(Some("1"), Some("b")),
        ];
        let lookup = ResponseLookup::from_values(&values);
        let entries: Vec<(&str, Option<&str>)> = lookup.iter().collect();
        assert_eq!(entries, vec![("1", Some("b")), ("None", Some("n"))]);
        assert_eq!(lookup.get("None"), Some(Some("n")));
    }

    #[test]
    fn key_forms() {
        assert_eq!(KeyForm::of("2"), KeyForm::Exact("2"));
        assert_eq!(
            KeyForm::of("1 | 3 | 50"),
            KeyForm::Alternatives(vec!["1", "3", "50"])
        );
        assert_eq!(
            KeyForm::of(r#"grep("Guatemalan", HISPORX)"#),
            KeyForm::TextSearch(Some("guatemalan".to_string()))
        );
        assert_eq!(KeyForm::of("grep(broken"), KeyForm::TextSearch(None));
    }

    #[test]
    fn only_the_last_key_decides_text_search() {
        let search = ValueMapping::new(Some(r#"grep("cuban", HISPORX)"#), Some("2"));
        let exact = ValueMapping::new(Some("1"), Some("1"));
        let trailing = ResponseLookup::from_values([&exact, &search]);
        assert!(trailing.ends_with_text_search());
        let leading = ResponseLookup::from_values([&search, &exact]);
        assert!(!leading.ends_with_text_search());
    }

    #[test]
    fn null_output_matches_null_cell() {
        let lookup = ResponseLookup::from_values(&[ValueMapping::new(Some("8"), None)]);
        assert!(lookup.maps_to(None));
        assert!(!lookup.maps_to(Some("8")));
    }
}
