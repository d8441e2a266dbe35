//! Missing-value tokens shared by ingestion and post-processing.

/// Literal written for every missing cell in the migrated output.
pub const NA_LITERAL: &str = "NA";

/// Text tokens read as missing in source tables.
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null", "<NA>"];

/// Returns true if the trimmed text is one of the recognized missing tokens.
///
/// # Examples
///
/// ```
/// use uds_common::is_missing_token;
///
/// assert!(is_missing_token("NA"));
/// assert!(is_missing_token("  "));
/// assert!(!is_missing_token("0"));
/// ```
pub fn is_missing_token(value: &str) -> bool {
    MISSING_TOKENS.contains(&value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_missing() {
        assert!(is_missing_token("<NA>"));
        assert!(is_missing_token("nan"));
        assert!(!is_missing_token("None"));
        assert!(!is_missing_token("na-ish"));
    }
}
