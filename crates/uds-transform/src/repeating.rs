//! Repeating-group expansion.
//!
//! A template such as `kid###yob` stands for `kid1yob` .. `kid15yob`. The
//! expander derives every member name for both schemas and maps or copies
//! the members present in the source. Values with no lookup entry keep
//! their source text.

use polars::prelude::StringChunked;
use tracing::debug;
use uds_model::{CrosswalkConfig, RepeatingFamily};

use crate::error::Result;
use crate::frame::Frame;
use crate::lookup::{NULL_KEY, ResponseLookup};
use crate::report::RepeatOutcome;

/// Name of member `index` of a family, built from a template.
pub fn member_name(family: &RepeatingFamily, template: &str, index: usize) -> String {
    let stem: String = template
        .replace(family.token.as_str(), "")
        .chars()
        .filter(|c| *c != '#')
        .collect();
    format!("{}{index}{stem}", family.token)
}

/// Expand one template pair over every member of its family.
///
/// Returns an empty outcome when the source template names no family.
pub fn expand_repeating(
    config: &CrosswalkConfig,
    source_template: &str,
    target_template: &str,
    source: &Frame,
    target: &mut Frame,
    lookup: Option<&ResponseLookup>,
) -> Result<RepeatOutcome> {
    let Some(family) = config.family_for(source_template) else {
        debug!(template = source_template, "no repeating family for template");
        return Ok(RepeatOutcome::default());
    };
    let lookup = lookup.filter(|lookup| !lookup.is_empty());

    let mut outcome = RepeatOutcome::default();
    for index in 1..=family.max_index {
        outcome.inspected += 1;
        let source_name = member_name(family, source_template, index);
        let Some(values) = source.text(&source_name) else {
            continue;
        };
        let target_name = member_name(family, target_template, index);
        let written = match lookup {
            Some(lookup) => remap(lookup, &values),
            None => values,
        };
        target.set_column(&target_name, written)?;
        outcome.written += 1;
    }
    debug!(
        template = source_template,
        inspected = outcome.inspected,
        written = outcome.written,
        "expanded repeating group"
    );
    Ok(outcome)
}

fn remap(lookup: &ResponseLookup, values: &StringChunked) -> StringChunked {
    values
        .into_iter()
        .map(|value| match lookup.get(value.unwrap_or(NULL_KEY)) {
            Some(mapped) => mapped.map(str::to_string),
            None => value.map(str::to_string),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uds_model::ValueMapping;

    #[test]
    fn member_names_drop_token_and_hashes() {
        let family = RepeatingFamily::new("kid", 15);
        assert_eq!(member_name(&family, "kid###yob", 3), "kid3yob");
        assert_eq!(member_name(&family, "kid#etpr", 12), "kid12etpr");
    }

    fn strings(frame: &Frame, name: &str) -> Vec<Option<String>> {
        frame
            .text(name)
            .map(|values| {
                values
                    .into_iter()
                    .map(|value| value.map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn unmatched_tpr_values_keep_source_text() {
        let config = CrosswalkConfig::default();
        let source = Frame::from_text_columns(vec![
            ("sib1pdx", vec![Some("1"), Some("7")]),
            ("sib3pdx", vec![Some("7"), None]),
        ])
        .expect("frame");
        let mut target = Frame::new(2);
        let lookup = ResponseLookup::from_values(&[ValueMapping::new(Some("1"), Some("01"))]);

        let outcome = expand_repeating(
            &config,
            "sib###pdx",
            "sib###etpr",
            &source,
            &mut target,
            Some(&lookup),
        )
        .expect("expand");

        assert_eq!(outcome, RepeatOutcome { inspected: 20, written: 2 });
        assert_eq!(
            strings(&target, "sib1etpr"),
            vec![Some("01".to_string()), Some("7".to_string())]
        );
        assert_eq!(strings(&target, "sib3etpr"), vec![Some("7".to_string()), None]);
    }

    #[test]
    fn missing_lookup_copies_verbatim() {
        let config = CrosswalkConfig::default();
        let source =
            Frame::from_text_columns(vec![("kid2yob", vec![Some("1990")])]).expect("frame");
        let mut target = Frame::new(1);
        let outcome =
            expand_repeating(&config, "kid###yob", "kid###yob", &source, &mut target, None)
                .expect("expand");
        assert_eq!(outcome.inspected, 15);
        assert_eq!(strings(&target, "kid2yob"), vec![Some("1990".to_string())]);
    }

    #[test]
    fn unknown_family_inspects_nothing() {
        let config = CrosswalkConfig::empty();
        let mut target = Frame::new(0);
        let outcome =
            expand_repeating(&config, "kid###yob", "kid###yob", &Frame::new(0), &mut target, None)
                .expect("expand");
        assert_eq!(outcome, RepeatOutcome::default());
    }
}
