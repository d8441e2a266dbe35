//! CLI library components for the UDS crosswalk.

pub mod logging;
pub mod pipeline;
