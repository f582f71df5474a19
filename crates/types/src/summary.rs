//! Observed attributes of completed units.
//!
//! A summary is built by the engine when a unit closes and handed to the
//! filters, which decide whether the unit is retained. Times are already
//! scaled.

use crate::{MessageId, PacketId, TerminalId, TransactionId};

/// A closed transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionSummary {
    pub id: TransactionId,
    pub start: f64,
    pub end: f64,
    pub message_count: u32,
    pub packet_count: u32,
    pub flit_count: u32,
}

impl TransactionSummary {
    pub fn application(&self) -> u32 {
        self.id.application()
    }

    pub fn latency(&self) -> f64 {
        self.end - self.start
    }
}

/// A closed message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageSummary {
    pub id: MessageId,
    pub transaction: TransactionId,
    pub source: TerminalId,
    pub destination: TerminalId,
    pub protocol_class: u32,
    pub opcode: u32,
    pub min_hop_count: u32,
    pub start: f64,
    pub end: f64,
    pub packet_count: u32,
    pub flit_count: u32,
}

impl MessageSummary {
    pub fn application(&self) -> u32 {
        self.transaction.application()
    }

    pub fn latency(&self) -> f64 {
        self.end - self.start
    }
}

/// A closed packet, together with the attributes of its enclosing message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketSummary {
    pub id: PacketId,
    pub transaction: TransactionId,
    pub source: TerminalId,
    pub destination: TerminalId,
    pub protocol_class: u32,
    pub opcode: u32,
    pub min_hop_count: u32,
    /// Send time of the head flit.
    pub start: f64,
    /// Head or tail arrival, depending on the latency mode.
    pub end: f64,
    pub flit_count: u32,
    pub hop_count: u32,
    /// Hops taken beyond the minimal path, floored at zero.
    pub non_min_hop_count: u32,
}

impl PacketSummary {
    pub fn application(&self) -> u32 {
        self.transaction.application()
    }

    pub fn latency(&self) -> f64 {
        self.end - self.start
    }
}
