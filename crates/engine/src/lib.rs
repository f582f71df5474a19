//! Streaming trace reconstruction.
//!
//! The engine consumes the decoded records of one simulator trace in file
//! order and rebuilds the latency of every transaction, message and packet
//! it contains. Structural violations abort the run.
//!
//! # Architecture
//!
//! ```text
//!   BufRead ──► driver::records ──► Engine::apply ──► per-unit state
//!                                        │
//!                         on close: FilterChain ──► latency samples
//!                                        │           detail sinks
//!                                        ▼
//!                              Engine::complete ──► EngineReport
//!                                                   latency / hop CSV
//! ```
//!
//! [`TransientAnalysis`] runs one engine per time bucket over the same
//! records to show how the statistics evolve over simulated time.
//!
//! # Example
//!
//! ```ignore
//! use ssparse_engine::{driver, Engine, EngineConfig, Sinks};
//!
//! let config = EngineConfig::default().with_scalar(0.001).with_filter("+app=0");
//! let engine = Engine::new(config, Sinks::new().with_latency(latency_file))?;
//! let report = driver::run(BufReader::new(trace_file), engine)?;
//! report.print_summary();
//! ```

mod config;
pub mod driver;
mod engine;
mod error;
mod report;
mod sink;
mod state;
mod transient;

pub use config::{ConfigError, EngineConfig};
pub use driver::{LineError, TraceError};
pub use engine::Engine;
pub use error::EngineError;
pub use report::{EngineReport, RejectedCounts};
pub use sink::Sinks;
pub use transient::{TimeAxis, TransientAnalysis, TransientConfig, TransientGrid, TransientRow};
