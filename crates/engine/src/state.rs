//! Partial aggregates of units that have opened but not yet closed.
//!
//! The trace never interleaves messages or packets, so at most one of each
//! is open at a time and a packet only exists inside a message:
//!
//! ```text
//!            +M                +P
//!   Idle ─────────► Message ─────────► Packet
//!        ◄─────────         ◄─────────
//!            -M                -P
//! ```
//!
//! Transactions are independent of this nesting and may overlap freely.

use ssparse_types::{
    MessageHeader, MessageSummary, PacketId, PacketSummary, TransactionId, TransactionSummary,
};

/// An open transaction.
#[derive(Debug, Clone)]
pub(crate) struct TransactionState {
    pub start: f64,
    /// Latest end time folded in from closed messages.
    pub end: f64,
    pub message_count: u32,
    pub packet_count: u32,
    pub flit_count: u32,
}

impl TransactionState {
    pub fn new(start: f64) -> Self {
        Self {
            start,
            end: f64::NEG_INFINITY,
            message_count: 0,
            packet_count: 0,
            flit_count: 0,
        }
    }

    pub fn summary(&self, id: TransactionId) -> TransactionSummary {
        TransactionSummary {
            id,
            start: self.start,
            end: self.end,
            message_count: self.message_count,
            packet_count: self.packet_count,
            flit_count: self.flit_count,
        }
    }
}

/// The open message.
#[derive(Debug, Clone)]
pub(crate) struct MessageState {
    pub header: MessageHeader,
    /// Earliest head send time of its packets.
    pub start: f64,
    /// Latest tail arrival of its packets.
    pub end: f64,
    pub packet_count: u32,
    pub flit_count: u32,
}

impl MessageState {
    pub fn new(header: MessageHeader) -> Self {
        Self {
            header,
            start: f64::INFINITY,
            end: f64::NEG_INFINITY,
            packet_count: 0,
            flit_count: 0,
        }
    }

    pub fn summary(&self) -> MessageSummary {
        MessageSummary {
            id: self.header.id,
            transaction: self.header.transaction,
            source: self.header.source,
            destination: self.header.destination,
            protocol_class: self.header.protocol_class,
            opcode: self.header.opcode,
            min_hop_count: self.header.min_hop_count,
            start: self.start,
            end: self.end,
            packet_count: self.packet_count,
            flit_count: self.flit_count,
        }
    }
}

/// Send and receive time of a packet's head flit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HeadFlit {
    pub send: f64,
    pub receive: f64,
}

/// The open packet.
#[derive(Debug, Clone)]
pub(crate) struct PacketState {
    pub id: PacketId,
    pub hop_count: u32,
    pub non_min_hop_count: u32,
    pub head: Option<HeadFlit>,
    pub tail_end: f64,
    pub flit_count: u32,
}

impl PacketState {
    pub fn new(id: PacketId, hop_count: u32, non_min_hop_count: u32) -> Self {
        Self {
            id,
            hop_count,
            non_min_hop_count,
            head: None,
            tail_end: f64::NEG_INFINITY,
            flit_count: 0,
        }
    }

    pub fn summary(&self, message: &MessageHeader, head: HeadFlit, end: f64) -> PacketSummary {
        PacketSummary {
            id: self.id,
            transaction: message.transaction,
            source: message.source,
            destination: message.destination,
            protocol_class: message.protocol_class,
            opcode: message.opcode,
            min_hop_count: message.min_hop_count,
            start: head.send,
            end,
            flit_count: self.flit_count,
            hop_count: self.hop_count,
            non_min_hop_count: self.non_min_hop_count,
        }
    }
}

/// Which of the singleton units are open.
#[derive(Debug, Clone, Default)]
pub(crate) enum Nesting {
    #[default]
    Idle,
    Message(MessageState),
    Packet(MessageState, PacketState),
}

impl Nesting {
    pub fn message(&self) -> Option<&MessageState> {
        match self {
            Nesting::Idle => None,
            Nesting::Message(message) | Nesting::Packet(message, _) => Some(message),
        }
    }

    pub fn packet(&self) -> Option<&PacketState> {
        match self {
            Nesting::Packet(_, packet) => Some(packet),
            _ => None,
        }
    }
}
