//! Engine configuration.

use serde::Deserialize;
use ssparse_filter::{FilterChain, FilterError};
use thiserror::Error;

/// A configuration rejected before any input is consumed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("latency scalar must be finite and positive, got {0}")]
    InvalidScalar(f64),

    #[error("invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("filters can't be time based in a transient analysis: {0}")]
    TimeFilterNotAllowed(String),

    #[error("bucket count must be at least one")]
    NoBuckets,

    #[error("time window {start}-{end} is invalid: {reason}")]
    InvalidTimeWindow {
        start: f64,
        end: f64,
        reason: &'static str,
    },
}

/// Parameters of one reconstruction run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Multiplier applied to raw integer timestamps.
    #[serde(default = "default_scalar")]
    pub scalar: f64,

    /// Report packet latency up to head arrival instead of tail arrival.
    #[serde(default)]
    pub packet_header_latency: bool,

    /// Track minimal and non-minimal hop counts.
    #[serde(default = "default_track_minimal_hops")]
    pub track_minimal_hops: bool,

    /// Filter specifications, all of which must accept a unit.
    #[serde(default)]
    pub filters: Vec<String>,
}

fn default_scalar() -> f64 {
    1.0
}

fn default_track_minimal_hops() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scalar: default_scalar(),
            packet_header_latency: false,
            track_minimal_hops: default_track_minimal_hops(),
            filters: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Set the latency scalar.
    pub fn with_scalar(mut self, scalar: f64) -> Self {
        self.scalar = scalar;
        self
    }

    /// Select head (`true`) or tail (`false`) arrival as packet end time.
    pub fn with_header_latency(mut self, enabled: bool) -> Self {
        self.packet_header_latency = enabled;
        self
    }

    /// Enable or disable minimal hop-count tracking.
    pub fn with_minimal_hops(mut self, enabled: bool) -> Self {
        self.track_minimal_hops = enabled;
        self
    }

    /// Append a filter specification.
    pub fn with_filter(mut self, spec: impl Into<String>) -> Self {
        self.filters.push(spec.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scalar.is_finite() || self.scalar <= 0.0 {
            return Err(ConfigError::InvalidScalar(self.scalar));
        }
        Ok(())
    }

    /// Validate and compile the filter specifications.
    pub fn compile(&self) -> Result<FilterChain, ConfigError> {
        self.validate()?;
        Ok(FilterChain::parse(&self.filters)?)
    }
}
