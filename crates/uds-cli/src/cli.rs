//! CLI argument definitions for the UDS crosswalk.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

/// Output file written by `migrate` when `--output` is not given.
pub const DEFAULT_OUTPUT: &str = "uds4_redcap_data.csv";

#[derive(Parser)]
#[command(
    name = "uds-crosswalk",
    version,
    about = "UDS Crosswalk - Migrate UDS3 data to UDS4",
    long_about = "Migrate UDS3 form data to the UDS4 layout.\n\n\
                  Compiles mapping-sheet exports into crosswalk rule sets and \n\
                  applies them to a UDS3 table, writing a UDS4-ordered CSV."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply rule sets to a UDS3 table and write the UDS4 table.
    Migrate(MigrateArgs),

    /// Compile mapping-sheet CSV exports into rule-set JSON files.
    Compile(CompileArgs),

    /// Print the effective configuration as TOML.
    ShowConfig(ConfigArgs),
}

#[derive(Parser)]
pub struct MigrateArgs {
    /// UDS3 data table (CSV).
    #[arg(value_name = "SOURCE_CSV")]
    pub source: PathBuf,

    /// Directory of rule-set JSON files, applied in file-name order.
    #[arg(value_name = "RULES_DIR")]
    pub rules_dir: PathBuf,

    /// Text file listing the UDS4 columns in output order, one per line.
    #[arg(value_name = "COLUMN_ORDER")]
    pub column_order: PathBuf,

    /// Output CSV path.
    #[arg(long = "output", short = 'o', value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// TOML file overriding the built-in configuration tables.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Parser)]
pub struct CompileArgs {
    /// Mapping-sheet CSV files, or directories containing them.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for the compiled `<stem>_mappings.json` files.
    #[arg(long = "output-dir", value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Parser)]
pub struct ConfigArgs {
    /// TOML file overriding the built-in configuration tables.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
