use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use uds_cli::pipeline::{
    compile_sheet, load_config, migrate_table, sheet_stem, write_output_csv,
};
use uds_ingest::{collect_inputs, read_column_order, read_source_table};
use uds_map::RuleSetRepository;
use uds_model::{RuleCategory, RuleSet};

use crate::cli::{CompileArgs, ConfigArgs, MigrateArgs};
use crate::types::{CompileResult, CompiledSheet, MigrationResult, RuleFileSummary};

pub fn run_migrate(args: &MigrateArgs) -> Result<MigrationResult> {
    let span = info_span!("migrate", source = %args.source.display());
    let _guard = span.enter();
    let start = Instant::now();

    let config = load_config(args.config.as_deref())?;
    let source = read_source_table(&args.source)
        .with_context(|| format!("load source table {}", args.source.display()))?;

    let repository = RuleSetRepository::open(&args.rules_dir)?;
    let stored = repository.load_all()?;
    if stored.is_empty() {
        warn!(dir = %args.rules_dir.display(), "no rule-set files found");
    }
    let mut rule_files = Vec::with_capacity(stored.len());
    let mut rule_sets: Vec<RuleSet> = Vec::with_capacity(stored.len());
    for entry in stored {
        info!(file = %entry.name, entries = entry.rules.len(), "loaded rule set");
        rule_files.push(RuleFileSummary {
            name: entry.name,
            entries: entry.rules.len(),
        });
        rule_sets.push(entry.rules);
    }

    let order = read_column_order(&args.column_order)
        .with_context(|| format!("load column order {}", args.column_order.display()))?;

    let (frame, report) = migrate_table(&source, &rule_sets, &order, &config)?;
    let rows = frame.height();
    let columns = frame.width();
    write_output_csv(frame, &args.output)?;

    info!(
        rows,
        columns,
        elapsed_ms = start.elapsed().as_millis(),
        "migrate finished"
    );
    Ok(MigrationResult {
        source: args.source.clone(),
        output: args.output.clone(),
        rule_files,
        report,
        rows,
        columns,
    })
}

pub fn run_compile(args: &CompileArgs) -> Result<CompileResult> {
    let span = info_span!("compile", output_dir = %args.output_dir.display());
    let _guard = span.enter();

    let inputs = collect_inputs(&args.inputs, "csv").context("discover mapping sheets")?;
    if inputs.is_empty() {
        warn!("no mapping sheets found");
    }
    let repository = RuleSetRepository::new(&args.output_dir)?;

    let mut result = CompileResult::default();
    for input in inputs {
        let compiled = compile_sheet(&input)
            .and_then(|rules| {
                let output = repository.save(&sheet_stem(&input), &rules)?;
                Ok((rules, output))
            });
        match compiled {
            Ok((rules, output)) => {
                let entries: BTreeMap<RuleCategory, usize> = RuleCategory::ALL
                    .into_iter()
                    .map(|category| (category, rules.entries(category).len()))
                    .collect();
                result.sheets.push(CompiledSheet {
                    input,
                    output,
                    entries,
                });
            }
            Err(error) => {
                warn!(path = %input.display(), error = %format!("{error:#}"), "skipped mapping sheet");
                result.errors.push(format!("{}: {error:#}", input.display()));
                result.has_errors = true;
            }
        }
    }
    Ok(result)
}

pub fn run_show_config(args: &ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let rendered = config.to_toml_string().context("render configuration")?;
    print!("{rendered}");
    Ok(())
}
