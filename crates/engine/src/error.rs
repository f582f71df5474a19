//! Reconstruction errors.

use ssparse_types::{FlitId, MessageId, PacketId, RecordKind, TransactionId};
use std::io;
use thiserror::Error;

/// Errors raised while replaying a trace.
///
/// Everything except [`EngineError::Io`] means the trace itself is
/// corrupted; none of them is recoverable.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("transaction {0} opened twice")]
    DuplicateTransaction(TransactionId),

    #[error("transaction {0} is not open")]
    UnknownTransaction(TransactionId),

    #[error("transaction {id} ends at {end} before its latest message end {latest}")]
    TransactionEndedEarly {
        id: TransactionId,
        end: f64,
        latest: f64,
    },

    #[error("transaction {0} closed while one of its messages is open")]
    TransactionClosedWithOpenMessage(TransactionId),

    #[error("message {new} opened while message {open} is open")]
    MessageAlreadyOpen { open: MessageId, new: MessageId },

    #[error("'{}' record without an open message", .record.tag())]
    NoOpenMessage { record: RecordKind },

    #[error("message closed while packet {0} is open")]
    PacketStillOpen(PacketId),

    #[error("packet {new} opened while packet {open} is open")]
    PacketAlreadyOpen { open: PacketId, new: PacketId },

    #[error("'{}' record without an open packet", .record.tag())]
    NoOpenPacket { record: RecordKind },

    #[error("message {0} closed without any packet")]
    EmptyMessage(MessageId),

    #[error("packet {0} closed without its head flit")]
    MissingHeadFlit(PacketId),

    #[error("flit {flit} received at {receive} before it was sent at {send}")]
    FlitReceivedBeforeSent { flit: FlitId, send: u64, receive: u64 },

    #[error("flit {flit} of packet {packet} precedes the head flit")]
    FlitBeforeHead { packet: PacketId, flit: FlitId },

    #[error("message {message} starts before transaction {transaction}")]
    MessageBeforeTransaction {
        message: MessageId,
        transaction: TransactionId,
    },

    #[error("{unit} ends at {end} before it starts at {start}")]
    TimeReversed {
        unit: &'static str,
        start: f64,
        end: f64,
    },

    #[error(
        "trace ended mid-structure: {open_transactions} open transaction(s), \
         message open: {message_open}, packet open: {packet_open}"
    )]
    Incomplete {
        open_transactions: usize,
        message_open: bool,
        packet_open: bool,
    },

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl EngineError {
    /// Whether this error indicates a corrupted trace rather than an I/O failure.
    pub fn is_corruption(&self) -> bool {
        !matches!(self, EngineError::Io(_))
    }
}
