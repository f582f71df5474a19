//! Filter construction errors.

use thiserror::Error;

/// A malformed filter specification.
///
/// Raised while compiling a filter, before any trace input is consumed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("empty filter specification")]
    Empty,

    #[error("invalid accept/reject flag '{0}' (expected '+' or '-')")]
    InvalidPolarity(char),

    #[error("invalid format, must have exactly one '=': {0}")]
    InvalidFormat(String),

    #[error("invalid filter field: {0}")]
    UnknownField(String),

    #[error("invalid range spec: '{0}'")]
    InvalidRange(String),

    #[error("time based specifications must define a range (ex: 100-200): '{0}'")]
    TimeRangeRequired(String),

    #[error("invalid number: '{0}'")]
    InvalidNumber(String),

    #[error("time must be non-negative: {0}")]
    NegativeTime(f64),

    #[error("invalid range bounds: {start} > {end}")]
    ReversedRange { start: String, end: String },

    #[error("overlapping range detected: {0}")]
    OverlappingRange(String),

    #[error("'{0}' is not a time field")]
    NotTimeField(&'static str),

    #[error("duplicate numbers detected: {0}")]
    DuplicateValue(u64),
}
