//! Feeding a textual trace through an engine.

use crate::{ConfigError, Engine, EngineError, EngineReport};
use ssparse_types::{RecordError, TraceRecord};
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::debug;

/// Why a single trace line was rejected.
#[derive(Debug, Error)]
pub enum LineError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors from replaying a whole trace.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("line {line}: {source}")]
    Line { line: usize, source: LineError },

    #[error("failed to read trace: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Complete(EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TraceError {
    /// Whether the failure indicates a corrupted trace.
    pub fn is_corruption(&self) -> bool {
        match self {
            TraceError::Line {
                source: LineError::Record(_),
                ..
            } => true,
            TraceError::Line {
                source: LineError::Engine(err),
                ..
            }
            | TraceError::Complete(err) => err.is_corruption(),
            TraceError::Io(_) | TraceError::Config(_) => false,
        }
    }
}

/// Decode a trace into `(line number, record)` pairs, skipping blank lines.
///
/// Line numbers are 1-based.
pub fn records<R: BufRead>(reader: R) -> impl Iterator<Item = Result<(usize, TraceRecord), TraceError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line_number = index + 1;
            let line = match line {
                Ok(line) => line,
                Err(err) => return Some(Err(TraceError::Io(err))),
            };
            match TraceRecord::parse(&line) {
                Ok(Some(record)) => Some(Ok((line_number, record))),
                Ok(None) => None,
                Err(err) => Some(Err(TraceError::Line {
                    line: line_number,
                    source: err.into(),
                })),
            }
        })
}

/// Apply every record of `reader` to `engine`, returning the record count.
pub fn replay<R: BufRead>(reader: R, engine: &mut Engine) -> Result<u64, TraceError> {
    let mut applied = 0;
    for entry in records(reader) {
        let (line, record) = entry?;
        engine.apply(record).map_err(|err| TraceError::Line {
            line,
            source: err.into(),
        })?;
        applied += 1;
    }
    debug!(records = applied, "Trace replayed");
    Ok(applied)
}

/// Replay a whole trace and complete the engine.
pub fn run<R: BufRead>(reader: R, mut engine: Engine) -> Result<EngineReport, TraceError> {
    replay(reader, &mut engine)?;
    engine.complete().map_err(TraceError::Complete)
}
