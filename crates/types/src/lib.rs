//! Core types for ssparse.
//!
//! This crate provides the vocabulary shared by every other crate in the
//! workspace:
//!
//! - **Identifiers**: TransactionId, MessageId, PacketId, FlitId, TerminalId
//! - **Records**: [`TraceRecord`], one decoded line of a simulator latency trace
//! - **Summaries**: the attribute tuples of a completed transaction, message
//!   or packet, as seen by filters
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend on
//! any other workspace crates, making it the foundation layer.

mod identifiers;
mod record;
mod summary;

pub use identifiers::{FlitId, MessageId, PacketId, TerminalId, TransactionId, APPLICATION_SHIFT};
pub use record::{parse_u64, MessageHeader, RecordError, RecordKind, TraceRecord};
pub use summary::{MessageSummary, PacketSummary, TransactionSummary};
