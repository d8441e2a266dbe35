//! Data model for the UDS crosswalk: specification rows, compiled rule sets,
//! and the immutable run configuration.

pub mod config;
pub mod error;
pub mod mapping;
pub mod spec;

pub use config::{CrosswalkConfig, RepeatingFamily};
pub use error::{ModelError, Result};
pub use mapping::{
    MappingEntry, MappingRule, NOT_AVAILABLE, RuleCategory, RuleKind, RuleSet, ValueMapping,
};
pub use spec::{ChangeFlag, ClassifiedRow, SpecRow, SpecialMapping};
