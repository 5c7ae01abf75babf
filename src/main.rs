use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use telemux::{
    analyze,
    cancel::{self, CancelToken},
    cli::{AnalyzeArgs, Cli, Command, MonitorArgs, OutputFormat, RecordArgs},
    config::FileConfig,
    csv_output::CsvReporter,
    ingest,
    json_output::JsonReporter,
    monitor::{self, Monitor},
    report::{Reporter, TextReporter},
    sink::CsvDirectory,
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber writing to stderr
///
/// `RUST_LOG` wins when set; otherwise `info`, or `trace` with `--debug`.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Open the byte source: a file or device path, or stdin
fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            tracing::info!("Reading from {}", path.display());
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

/// SIGINT/SIGTERM stop the run cleanly; fall back to an inert token if the
/// handlers cannot be installed
fn cancel_token() -> CancelToken {
    match cancel::install_signal_handlers() {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!("Cannot install signal handlers: {}", e);
            CancelToken::new()
        }
    }
}

fn run_record(args: RecordArgs, mut config: FileConfig) -> Result<()> {
    if let Some(dir) = args.out_dir {
        config.ingest.out_dir = dir;
    }
    if let Some(max) = args.max_line_len {
        config.ingest.max_line_len = max;
    }
    config.ingest.flush_every_row |= args.flush_every_row;
    if let Some(max) = args.max_kinds {
        config.ingest.max_kinds = max;
    }
    config
        .ingest
        .validate()
        .map_err(telemux::Error::Config)?;

    let input = open_input(args.input.as_deref())?;
    let sinks = CsvDirectory::create(config.ingest.out_dir.clone()).with_context(|| {
        format!(
            "Failed to prepare output directory {}",
            config.ingest.out_dir.display()
        )
    })?;

    let stats = ingest::run_ingest(input, sinks, &config.ingest, cancel_token())?;

    for kind in &stats.sinks.kinds {
        eprintln!("{:>8} rows  {}", kind.rows, kind.location);
    }
    eprintln!(
        "{} records, {} malformed lines, {} oversized lines, {} over kind limit{}",
        stats.records,
        stats.parse_failures,
        stats.decoder.oversized_lines,
        stats.kinds_rejected,
        if stats.cancelled { " (interrupted)" } else { "" }
    );
    Ok(())
}

fn run_analyze(args: AnalyzeArgs, mut config: FileConfig) -> Result<()> {
    let analysis = &mut config.analysis;
    if let Some(threshold) = args.threshold {
        analysis.threshold = threshold;
    }
    if let Some(k) = args.iqr_multiplier {
        analysis.iqr_multiplier = k;
    }
    if let Some(floor) = args.lower_floor {
        analysis.lower_floor = floor;
    }
    if let Some(bins) = args.bins {
        analysis.histogram_bins = bins;
    }
    analysis.validate().map_err(telemux::Error::Config)?;

    let run = analyze::analyze_file(&args.file, analysis)?;

    let stdout = io::stdout().lock();
    match args.format {
        OutputFormat::Text => {
            TextReporter::new(stdout, analysis.histogram_bins).report(&run.outcome)?
        }
        OutputFormat::Json => JsonReporter::new(stdout)
            .with_source(args.file.display().to_string())
            .report(&run.outcome)?,
        OutputFormat::Csv => CsvReporter::new(stdout).report(&run.outcome)?,
    }
    Ok(())
}

fn run_monitor(args: MonitorArgs, mut config: FileConfig) -> Result<()> {
    if let Some(kinds) = args.kinds {
        config.monitor.kinds = kinds;
    }
    if let Some(threshold) = args.threshold {
        config.analysis.threshold = threshold;
    }
    if let Some(max) = args.max_line_len {
        config.ingest.max_line_len = max;
    }
    config
        .monitor
        .validate()
        .and_then(|()| config.ingest.validate())
        .map_err(telemux::Error::Config)?;

    let input = open_input(args.input.as_deref())?;
    let mut watcher = Monitor::new(config.monitor.kinds, config.analysis.threshold);
    let mut stdout = io::stdout().lock();
    let stats = monitor::run_monitor(
        input,
        &mut stdout,
        &mut watcher,
        config.ingest.max_line_len,
        cancel_token(),
    )?;

    tracing::info!(
        echoed = stats.echoed,
        deltas = stats.deltas,
        skipped = stats.skipped,
        cancelled = stats.cancelled,
        "Monitor stopped"
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    match args.command {
        Command::Record(sub) => run_record(sub, config),
        Command::Analyze(sub) => run_analyze(sub, config),
        Command::Monitor(sub) => run_monitor(sub, config),
    }
}
