//! Migration and compilation steps shared by the CLI commands.
//!
//! Each step takes plain inputs and returns plain outputs so the commands
//! stay thin and the steps can be exercised without a terminal.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use tracing::{debug, info};

use uds_ingest::read_spec_rows;
use uds_map::{classify_rows, compile_rule_set};
use uds_model::{CrosswalkConfig, RuleSet};
use uds_transform::{CrosswalkEngine, Frame, RunReport, finalize};

/// UTF-8 byte-order mark written ahead of the output header.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Load the run configuration, falling back to the built-in tables.
pub fn load_config(path: Option<&Path>) -> Result<CrosswalkConfig> {
    match path {
        Some(path) => {
            let config = CrosswalkConfig::load(path)
                .with_context(|| format!("load configuration {}", path.display()))?;
            info!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(CrosswalkConfig::default()),
    }
}

/// Convert the source table for the engine and apply zero-padding.
pub fn prepare_source(df: &DataFrame, config: &CrosswalkConfig) -> Result<Frame> {
    let mut frame = Frame::from_data_frame(df).context("convert source table")?;
    for (column, width) in &config.zero_pad_columns {
        if frame
            .zero_pad(column, *width)
            .with_context(|| format!("zero-pad {column}"))?
        {
            debug!(column = %column, width, "zero-padded source column");
        } else {
            debug!(column = %column, "zero-pad column not in source table");
        }
    }
    Ok(frame)
}

/// Apply the rule sets in order and shape the result to the column order.
pub fn migrate_table(
    df: &DataFrame,
    rule_sets: &[RuleSet],
    order: &[String],
    config: &CrosswalkConfig,
) -> Result<(Frame, RunReport)> {
    let mut source = prepare_source(df, config)?;
    let engine = CrosswalkEngine::new(config);
    let (target, report) = engine
        .migrate(rule_sets, &mut source)
        .context("apply rule sets")?;
    let output = finalize(target, config, order).context("finalize output table")?;
    info!(
        rows = output.height(),
        columns = output.width(),
        gaps = report.gaps.len(),
        "migration complete"
    );
    Ok((output, report))
}

/// Read, classify and compile one mapping sheet.
pub fn compile_sheet(path: &Path) -> Result<RuleSet> {
    let rows = read_spec_rows(path)
        .with_context(|| format!("read mapping sheet {}", path.display()))?;
    let classified = classify_rows(rows);
    let rules = compile_rule_set(&classified);
    info!(path = %path.display(), entries = rules.len(), "compiled mapping sheet");
    Ok(rules)
}

/// File stem used to name a compiled rule set.
pub fn sheet_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("mappings")
        .to_string()
}

/// Write the final table as CSV with a byte-order mark.
pub fn write_output_csv(frame: Frame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    let mut df: DataFrame = frame.into_data_frame();

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut buffered = BufWriter::new(file);
    buffered
        .write_all(UTF8_BOM)
        .with_context(|| format!("write {}", path.display()))?;
    CsvWriter::new(&mut buffered)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("write {}", path.display()))?;
    buffered
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), rows = df.height(), "wrote output table");
    Ok(())
}
