//! SuperSim trace parser.
//!
//! Reconstructs transaction, message and packet latencies from a simulator
//! trace and writes aggregate latency and hop-count reports.
//!
//! # Usage
//!
//! ```bash
//! # Aggregate latency and hop counts
//! ssparse parse trace.log -l latency.csv -c hops.csv
//!
//! # Per-packet detail for application 0, timestamps in microseconds
//! ssparse parse trace.log -p packets.csv -s 0.001 -f +app=0
//!
//! # Filters starting with '-' exclude matching units
//! ssparse parse trace.log -l latency.csv -f -pc=1
//!
//! # Settings from a file, overridden by flags
//! ssparse parse trace.log --config ssparse.toml -s 0.5
//!
//! # Statistics over 40 buckets of simulated time
//! ssparse transient trace.log transient.csv --time recv
//!
//! # Compressed traces work the same way
//! ssparse parse trace.mpf.gz -l latency.csv.gz
//! ```
//!
//! Files whose names end in `.gz` are read and written gzip-compressed.
//! Logging goes to stderr and honours `RUST_LOG`.

mod config;
mod files;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use config::FileConfig;
use ssparse_engine::{
    driver, Engine, EngineConfig, TimeAxis, TraceError, TransientAnalysis, TransientConfig,
};
use files::{open_trace, write_output};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// SuperSim trace parser
///
/// Computes latency distributions and hop counts from simulator traces.
#[derive(Parser, Debug)]
#[command(name = "ssparse")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn,ssparse=info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a trace into latency and hop-count reports
    Parse(ParseArgs),

    /// Bucket a trace over simulated time
    Transient(TransientArgs),
}

#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Trace file to parse
    pub input: PathBuf,

    /// Write per-transaction start,end lines
    #[arg(short = 't', long)]
    pub transactions: Option<PathBuf>,

    /// Write per-message start,end lines
    #[arg(short = 'm', long)]
    pub messages: Option<PathBuf>,

    /// Write per-packet start,end lines
    #[arg(short = 'p', long)]
    pub packets: Option<PathBuf>,

    /// Write the aggregate latency report
    #[arg(short = 'l', long)]
    pub latency: Option<PathBuf>,

    /// Write the hop-count report
    #[arg(short = 'c', long)]
    pub hop_counts: Option<PathBuf>,

    /// Multiply every timestamp by this value
    #[arg(short = 's', long)]
    pub scalar: Option<f64>,

    /// Measure packets to the head flit's arrival instead of the tail's
    #[arg(long)]
    pub header_latency: bool,

    /// Skip the minimal/non-minimal hop breakdown
    #[arg(long)]
    pub no_minimal_hops: bool,

    /// Filter such as +app=0 or -send=0-1000 (repeatable)
    #[arg(short = 'f', long = "filter", allow_hyphen_values = true)]
    pub filters: Vec<String>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Do not print the summary
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

#[derive(Args, Debug)]
struct TransientArgs {
    /// Trace file to analyse
    input: PathBuf,

    /// CSV file to write
    output: PathBuf,

    /// Number of time buckets
    #[arg(short = 'b', long, default_value_t = 40)]
    buckets: usize,

    /// Lower bound of the analysed range
    #[arg(long)]
    min_time: Option<f64>,

    /// Upper bound of the analysed range
    #[arg(long)]
    max_time: Option<f64>,

    /// Which time places a unit in a bucket: send, start, end or recv
    #[arg(short = 't', long = "time", default_value = "send")]
    axis: TimeAxis,

    /// Multiply every timestamp by this value
    #[arg(short = 's', long)]
    scalar: Option<f64>,

    /// Non-time filter such as +app=0 (repeatable)
    #[arg(short = 'f', long = "filter", allow_hyphen_values = true)]
    filters: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Parse(args) => parse(args),
        Command::Transient(args) => transient(args),
    }
}

fn parse(args: ParseArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            FileConfig::load(path)?
        }
        None => FileConfig::default(),
    };
    config.apply_overrides(&args);
    debug!(?config, "Effective configuration");

    let reader = open_trace(&args.input)?;
    let sinks = config.output.open()?;
    let engine = Engine::new(config.engine, sinks).context("Invalid engine configuration")?;

    let report = check_trace(&args.input, driver::run(reader, engine))?;

    if !args.quiet {
        report.print_summary();
    }
    Ok(())
}

fn transient(args: TransientArgs) -> Result<()> {
    let mut engine = EngineConfig::default();
    if let Some(scalar) = args.scalar {
        engine = engine.with_scalar(scalar);
    }
    for filter in args.filters {
        engine = engine.with_filter(filter);
    }

    let mut config = TransientConfig::default()
        .with_buckets(args.buckets)
        .with_axis(args.axis)
        .with_engine(engine);
    if let Some(time) = args.min_time {
        config = config.with_min_time(time);
    }
    if let Some(time) = args.max_time {
        config = config.with_max_time(time);
    }

    let analysis = TransientAnalysis::new(config).context("Invalid transient configuration")?;
    let grid = check_trace(&args.input, analysis.run(open_trace(&args.input)?))?;

    write_output(&args.output, &grid.to_csv())?;
    info!(
        buckets = grid.rows.len(),
        output = %args.output.display(),
        "Transient analysis written"
    );
    Ok(())
}

fn check_trace<T>(path: &Path, result: Result<T, TraceError>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_corruption() => {
            bail!("{}: {err}; the input file is likely corrupted", path.display())
        }
        Err(err) => {
            Err(anyhow::Error::new(err).context(format!("Failed to process {}", path.display())))
        }
    }
}
