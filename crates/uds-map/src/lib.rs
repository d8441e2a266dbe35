//! Rule classification, compilation, and storage for the UDS crosswalk.
//!
//! - **classify**: labels each target-variable group with a [`RuleCategory`]
//! - **compile**: builds a serializable [`RuleSet`] from classified rows
//! - **repository**: reads and writes rule-set JSON files
//!
//! [`RuleCategory`]: uds_model::RuleCategory
//! [`RuleSet`]: uds_model::RuleSet

pub mod classify;
pub mod compile;
pub mod repository;

pub use classify::{FREE_TEXT_MARKER, classify_group, classify_rows};
pub use compile::{BLANK_PLACEHOLDER, clean_text, compile_rule_set};
pub use repository::{RuleSetRepository, StoredRuleSet, load_rule_set, to_json_string};
