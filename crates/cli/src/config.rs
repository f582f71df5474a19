//! TOML configuration for `ssparse parse`.
//!
//! ```toml
//! [engine]
//! scalar = 0.001
//! packet_header_latency = false
//! track_minimal_hops = true
//! filters = ["+app=0", "-pc=1"]
//!
//! [output]
//! transactions = "transactions.csv"
//! messages = "messages.csv"
//! packets = "packets.csv"
//! latency = "latency.csv"
//! hop_counts = "hops.csv"
//! ```
//!
//! Command-line flags override file values; command-line filters are
//! appended to the file's.

use crate::files::create_output;
use crate::ParseArgs;
use anyhow::{Context, Result};
use serde::Deserialize;
use ssparse_engine::{EngineConfig, Sinks};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Destination files; an absent entry disables that output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub transactions: Option<PathBuf>,
    pub messages: Option<PathBuf>,
    pub packets: Option<PathBuf>,
    /// Latency aggregate CSV.
    pub latency: Option<PathBuf>,
    /// Hop-count CSV.
    pub hop_counts: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply command-line overrides to the configuration.
    pub fn apply_overrides(&mut self, args: &ParseArgs) {
        if let Some(scalar) = args.scalar {
            self.engine.scalar = scalar;
        }
        if args.header_latency {
            self.engine.packet_header_latency = true;
        }
        if args.no_minimal_hops {
            self.engine.track_minimal_hops = false;
        }
        self.engine.filters.extend(args.filters.iter().cloned());

        let output = &mut self.output;
        for (target, value) in [
            (&mut output.transactions, &args.transactions),
            (&mut output.messages, &args.messages),
            (&mut output.packets, &args.packets),
            (&mut output.latency, &args.latency),
            (&mut output.hop_counts, &args.hop_counts),
        ] {
            if let Some(path) = value {
                *target = Some(path.clone());
            }
        }
    }
}

impl OutputConfig {
    /// Create every configured output file; `.gz` names are compressed.
    pub fn open(&self) -> Result<Sinks> {
        let mut sinks = Sinks::new();
        if let Some(path) = &self.transactions {
            sinks = sinks.with_transactions(create_output(path)?);
        }
        if let Some(path) = &self.messages {
            sinks = sinks.with_messages(create_output(path)?);
        }
        if let Some(path) = &self.packets {
            sinks = sinks.with_packets(create_output(path)?);
        }
        if let Some(path) = &self.latency {
            sinks = sinks.with_latency(create_output(path)?);
        }
        if let Some(path) = &self.hop_counts {
            sinks = sinks.with_hop_counts(create_output(path)?);
        }
        Ok(sinks)
    }
}
