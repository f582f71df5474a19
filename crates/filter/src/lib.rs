//! Acceptance filters for completed transactions, messages and packets.
//!
//! A filter is compiled once from a textual specification:
//!
//! ```text
//! <+|-><field>=<range>[,<range>...]
//! ```
//!
//! `+` retains units whose field value matches one of the ranges, `-` retains
//! the ones that do not. Integer fields take single values or inclusive
//! `a-b` ranges; time fields (`start`/`send`, `end`/`recv`) take half-open
//! `a-b` ranges only.
//!
//! ```ignore
//! let chain = FilterChain::parse(["+app=0-3", "-pc=1"])?;
//! if chain.packet(&summary) {
//!     // record it
//! }
//! ```
//!
//! A field that does not describe a unit kind (hop count for a transaction,
//! say) always passes that unit, whatever the polarity.

mod chain;
mod error;
mod field;
mod filter;

pub use chain::FilterChain;
pub use error::FilterError;
pub use field::FilterField;
pub use filter::{Filter, TimeRange};
