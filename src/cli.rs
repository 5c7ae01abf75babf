//! CLI argument parsing for telemux

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for analysis reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with histogram (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// Filtered delta-times as a single CSV column
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "telemux")]
#[command(version)]
#[command(about = "Demultiplex sensor telemetry by kind and analyse hall-sensor pulse timing", long_about = None)]
pub struct Cli {
    /// TOML configuration file; command-line flags override its values
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable trace-level diagnostics on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split a `kind,timestamp,amplitude` stream into one CSV file per kind
    Record(RecordArgs),
    /// Extract pulse delta-times from a per-kind CSV file and summarize them
    Analyze(AnalyzeArgs),
    /// Echo selected kinds live and print delta-times as pulses arrive
    Monitor(MonitorArgs),
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Read from this file or device instead of stdin
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Directory for per-kind CSV files
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Discard lines longer than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_line_len: Option<usize>,

    /// Flush every sink after each row
    #[arg(long)]
    pub flush_every_row: bool,

    /// Most distinct kinds per run; records of further kinds are dropped
    #[arg(long, value_name = "N")]
    pub max_kinds: Option<usize>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Per-kind CSV file written by `telemux record`
    #[arg(value_name = "CSV_FILE")]
    pub file: PathBuf,

    /// Amplitudes strictly below this value count as pulses
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    pub threshold: Option<i64>,

    /// IQR multiplier for the outlier bounds
    #[arg(short = 'k', long, value_name = "K")]
    pub iqr_multiplier: Option<f64>,

    /// Minimum value of the lower outlier bound
    #[arg(long, value_name = "F", allow_negative_numbers = true)]
    pub lower_floor: Option<f64>,

    /// Number of histogram bins in text output
    #[arg(long, value_name = "N")]
    pub bins: Option<usize>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Read from this file or device instead of stdin
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Discard lines longer than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_line_len: Option<usize>,

    /// Kinds to watch, comma separated
    #[arg(long, value_delimiter = ',', value_name = "KINDS")]
    pub kinds: Option<Vec<String>>,

    /// Amplitudes strictly below this value count as pulses
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    pub threshold: Option<i64>,
}
