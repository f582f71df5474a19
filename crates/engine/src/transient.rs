//! Transient analysis: latency and hop-count statistics over time.
//!
//! The simulated time range, from the earliest flit send to the latest flit
//! arrival, is split into equal buckets. Every bucket gets its own engine
//! whose filter chain is the user's filters plus a half-open time window
//! selecting that bucket, and all engines consume the same records.
//!
//! ```text
//!   range   |--------|--------|--------| ... |--------|
//!   bucket      0        1        2             N-1
//!   filter  +send=t0-t1  +send=t1-t2  ...
//! ```
//!
//! The result is a grid with one row per bucket, keyed by the bucket start.

use crate::driver::{records, LineError, TraceError};
use crate::{ConfigError, Engine, EngineConfig, EngineReport, Sinks};
use ssparse_filter::{Filter, FilterChain, FilterField, TimeRange};
use ssparse_stats::{csv, OrderStatistics};
use ssparse_types::TraceRecord;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;
use tracing::info;

/// Slack allowed when checking a requested window against the simulated range.
const TOLERANCE: f64 = 1e-6;

/// Which time of a unit places it in a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeAxis {
    #[default]
    Send,
    Start,
    End,
    Recv,
}

impl TimeAxis {
    pub fn name(self) -> &'static str {
        match self {
            TimeAxis::Send => "send",
            TimeAxis::Start => "start",
            TimeAxis::End => "end",
            TimeAxis::Recv => "recv",
        }
    }

    pub fn field(self) -> FilterField {
        match self {
            TimeAxis::Send | TimeAxis::Start => FilterField::Start,
            TimeAxis::End | TimeAxis::Recv => FilterField::End,
        }
    }
}

impl fmt::Display for TimeAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeAxis {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "send" => Ok(TimeAxis::Send),
            "start" => Ok(TimeAxis::Start),
            "end" => Ok(TimeAxis::End),
            "recv" => Ok(TimeAxis::Recv),
            other => Err(format!(
                "invalid time axis '{other}' (expected send, start, end or recv)"
            )),
        }
    }
}

/// Parameters of a transient analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct TransientConfig {
    pub buckets: usize,
    /// Narrow the range from below; must lie inside the simulated range.
    pub min_time: Option<f64>,
    /// Narrow the range from above; must lie inside the simulated range.
    pub max_time: Option<f64>,
    pub axis: TimeAxis,
    /// Per-bucket engine settings. Its filters must not be time based.
    pub engine: EngineConfig,
}

impl Default for TransientConfig {
    fn default() -> Self {
        Self {
            buckets: 40,
            min_time: None,
            max_time: None,
            axis: TimeAxis::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl TransientConfig {
    pub fn with_buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }

    pub fn with_min_time(mut self, time: f64) -> Self {
        self.min_time = Some(time);
        self
    }

    pub fn with_max_time(mut self, time: f64) -> Self {
        self.max_time = Some(time);
        self
    }

    pub fn with_axis(mut self, axis: TimeAxis) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }
}

/// One bucket of the grid.
#[derive(Debug, Clone)]
pub struct TransientRow {
    /// Start of the bucket.
    pub time: f64,
    /// Values for [`TransientGrid::hop_columns`], NaN where absent.
    pub hop_values: Vec<f64>,
    pub packets: OrderStatistics,
}

/// Per-bucket statistics.
#[derive(Debug, Clone, Default)]
pub struct TransientGrid {
    pub hop_columns: Vec<String>,
    pub rows: Vec<TransientRow>,
}

impl TransientGrid {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as CSV; an empty grid renders as an empty string.
    pub fn to_csv(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut out = String::from("Time");
        for column in self
            .hop_columns
            .iter()
            .map(String::as_str)
            .chain(csv::LATENCY_HEADER[1..].iter().copied())
        {
            out.push(',');
            out.push_str(column);
        }
        out.push('\n');

        for row in &self.rows {
            out.push_str(&csv::format_value(row.time));
            for value in &row.hop_values {
                out.push(',');
                out.push_str(&csv::format_value(*value));
            }
            // The latency row minus its label.
            let latency = csv::latency_row("", &row.packets);
            out.push_str(&latency);
            out.push('\n');
        }
        out
    }
}

/// A validated transient analysis, ready to run over a trace.
#[derive(Debug, Clone)]
pub struct TransientAnalysis {
    config: TransientConfig,
    filters: FilterChain,
}

impl TransientAnalysis {
    pub fn new(config: TransientConfig) -> Result<Self, ConfigError> {
        if config.buckets == 0 {
            return Err(ConfigError::NoBuckets);
        }
        config.engine.validate()?;
        if let (Some(start), Some(end)) = (config.min_time, config.max_time) {
            if start > end {
                return Err(ConfigError::InvalidTimeWindow {
                    start,
                    end,
                    reason: "start must be <= end",
                });
            }
        }

        let mut filters = FilterChain::new();
        for spec in &config.engine.filters {
            let filter = Filter::parse(spec)?;
            if filter.field().is_time() {
                return Err(ConfigError::TimeFilterNotAllowed(spec.clone()));
            }
            filters.push(filter);
        }
        Ok(Self { config, filters })
    }

    pub fn config(&self) -> &TransientConfig {
        &self.config
    }

    /// Decode the whole trace, then run every bucket over it.
    pub fn run<R: BufRead>(&self, reader: R) -> Result<TransientGrid, TraceError> {
        let trace = records(reader).collect::<Result<Vec<_>, _>>()?;

        let Some((start, end)) = self.window(&trace)? else {
            info!("Trace has no flits, transient output is empty");
            return Ok(TransientGrid::default());
        };
        let edges = bucket_edges(start, end, self.config.buckets);
        info!(
            start,
            end,
            buckets = self.config.buckets,
            axis = %self.config.axis,
            "Running transient analysis"
        );

        let mut engines = edges
            .windows(2)
            .map(|edge| {
                let mut chain = self.filters.clone();
                let window = TimeRange {
                    start: edge[0],
                    end: edge[1],
                };
                chain.push(Filter::accept_window(self.config.axis.field(), window)?);
                Ok(Engine::with_filters(
                    self.config.engine.clone(),
                    chain,
                    Sinks::new(),
                ))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        for &(line, record) in &trace {
            for engine in &mut engines {
                engine.apply(record).map_err(|err| TraceError::Line {
                    line,
                    source: LineError::Engine(err),
                })?;
            }
        }

        let reports = engines
            .into_iter()
            .map(Engine::complete)
            .collect::<Result<Vec<_>, _>>()
            .map_err(TraceError::Complete)?;
        Ok(grid(&edges, reports))
    }

    /// The analysed time range, or `None` when the trace has no flits.
    fn window(&self, trace: &[(usize, TraceRecord)]) -> Result<Option<(f64, f64)>, TraceError> {
        let scalar = self.config.engine.scalar;
        let mut range: Option<(f64, f64)> = None;
        for (_, record) in trace {
            if let TraceRecord::Flit {
                send_time,
                receive_time,
                ..
            } = *record
            {
                let send = send_time as f64 * scalar;
                let receive = receive_time as f64 * scalar;
                range = Some(match range {
                    None => (send, receive),
                    Some((start, end)) => (start.min(send), end.max(receive)),
                });
            }
        }
        let Some((mut start, mut end)) = range else {
            return Ok(None);
        };

        let invalid = move |reason: &'static str| {
            TraceError::Config(ConfigError::InvalidTimeWindow { start, end, reason })
        };
        if let Some(min_time) = self.config.min_time {
            if min_time < start - TOLERANCE || min_time >= end + TOLERANCE {
                return Err(invalid("min time is outside the simulated range"));
            }
        }
        if let Some(max_time) = self.config.max_time {
            if max_time <= start - TOLERANCE || max_time > end + TOLERANCE {
                return Err(invalid("max time is outside the simulated range"));
            }
        }
        // Bounds within the tolerance are pulled back onto the range.
        let (low, high) = (start, end);
        if let Some(min_time) = self.config.min_time {
            start = min_time.clamp(low, high);
        }
        if let Some(max_time) = self.config.max_time {
            end = max_time.clamp(low, high);
        }
        Ok(Some((start, end)))
    }
}

/// `buckets + 1` edges from `start` to `end`, the last one exactly `end`.
fn bucket_edges(start: f64, end: f64, buckets: usize) -> Vec<f64> {
    let width = (end - start) / buckets as f64;
    let mut edges: Vec<f64> = (0..buckets).map(|i| start + width * i as f64).collect();
    edges.push(end);
    edges
}

fn grid(edges: &[f64], reports: Vec<EngineReport>) -> TransientGrid {
    let mut hops = BTreeSet::new();
    let mut min_hops = BTreeSet::new();
    let mut non_min_hops = BTreeSet::new();
    for report in reports.iter().filter_map(|r| r.hop_counts.as_ref()) {
        hops.extend(report.hops.fractions.iter().map(|(k, _)| *k));
        if let Some(minimal) = &report.minimal {
            min_hops.extend(minimal.min_hops.fractions.iter().map(|(k, _)| *k));
            non_min_hops.extend(minimal.non_min_hops.fractions.iter().map(|(k, _)| *k));
        }
    }

    let mut hop_columns = vec!["AveHops".to_string()];
    hop_columns.extend(hops.iter().map(|k| format!("PerHops{k}")));
    hop_columns.push("AveMinHops".to_string());
    hop_columns.push("PerMinimal".to_string());
    hop_columns.extend(min_hops.iter().map(|k| format!("PerMinHops{k}")));
    hop_columns.push("AveNonMinHops".to_string());
    hop_columns.push("PerNonMinimal".to_string());
    hop_columns.extend(non_min_hops.iter().map(|k| format!("PerNonMinHops{k}")));

    let rows = edges
        .iter()
        .zip(reports)
        .map(|(&time, report)| {
            let values: HashMap<String, f64> = report
                .hop_counts
                .as_ref()
                .map(|hops| hops.columns())
                .unwrap_or_default()
                .into_iter()
                .collect();
            TransientRow {
                time,
                hop_values: hop_columns
                    .iter()
                    .map(|column| values.get(column).copied().unwrap_or(f64::NAN))
                    .collect(),
                packets: report.packets,
            }
        })
        .collect();

    TransientGrid { hop_columns, rows }
}
