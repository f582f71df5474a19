//! Trace record decoding.
//!
//! # Line Format
//!
//! One record per line, fields comma separated, the leading token selecting
//! the record kind:
//!
//! ```text
//! +T,<trans>,<start>
//! -T,<trans>,<end>
//! +M,<msg>,<src>,<dst>,<trans>,<protocol class>,<min hop count>,<opcode>
//! -M
//! +P,<pkt>,<hop count>
//! -P
//! F,<flit>,<send time>,<receive time>
//! ```
//!
//! Times are raw integer simulator ticks; scaling happens in the engine.

use crate::{FlitId, MessageId, PacketId, TerminalId, TransactionId};
use thiserror::Error;

/// Errors that can occur while decoding a trace line.
///
/// Every variant means the trace itself is corrupted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("unknown record kind '{0}'")]
    UnknownKind(String),

    #[error("'{kind}' record is missing field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("invalid value for '{field}': '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("'{kind}' record has unexpected trailing field '{extra}'")]
    TrailingFields { kind: &'static str, extra: String },
}

/// The seven record kinds of the trace format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    TransactionStart,
    TransactionEnd,
    MessageStart,
    MessageEnd,
    PacketStart,
    PacketEnd,
    Flit,
}

impl RecordKind {
    /// Leading token of this kind on the wire.
    pub fn tag(self) -> &'static str {
        match self {
            RecordKind::TransactionStart => "+T",
            RecordKind::TransactionEnd => "-T",
            RecordKind::MessageStart => "+M",
            RecordKind::MessageEnd => "-M",
            RecordKind::PacketStart => "+P",
            RecordKind::PacketEnd => "-P",
            RecordKind::Flit => "F",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "+T" => Some(RecordKind::TransactionStart),
            "-T" => Some(RecordKind::TransactionEnd),
            "+M" => Some(RecordKind::MessageStart),
            "-M" => Some(RecordKind::MessageEnd),
            "+P" => Some(RecordKind::PacketStart),
            "-P" => Some(RecordKind::PacketEnd),
            "F" => Some(RecordKind::Flit),
            _ => None,
        }
    }
}

/// Fields carried by a message-open record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub id: MessageId,
    pub source: TerminalId,
    pub destination: TerminalId,
    /// Transaction that owns this message.
    pub transaction: TransactionId,
    pub protocol_class: u32,
    /// Shortest possible path length from source to destination.
    pub min_hop_count: u32,
    pub opcode: u32,
}

/// One decoded trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceRecord {
    TransactionStart {
        id: TransactionId,
        time: u64,
    },
    TransactionEnd {
        id: TransactionId,
        time: u64,
    },
    MessageStart(MessageHeader),
    MessageEnd,
    PacketStart {
        id: PacketId,
        hop_count: u32,
    },
    PacketEnd,
    Flit {
        id: FlitId,
        send_time: u64,
        receive_time: u64,
    },
}

impl TraceRecord {
    /// Decode one line.
    ///
    /// Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, RecordError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let mut tokens = line.split(',');
        let tag = tokens.next().unwrap_or_default().trim();
        let kind =
            RecordKind::from_tag(tag).ok_or_else(|| RecordError::UnknownKind(tag.to_string()))?;
        let mut fields = Fields { kind, tokens };

        let record = match kind {
            RecordKind::TransactionStart => TraceRecord::TransactionStart {
                id: TransactionId(fields.u64("transaction id")?),
                time: fields.u64("start time")?,
            },
            RecordKind::TransactionEnd => TraceRecord::TransactionEnd {
                id: TransactionId(fields.u64("transaction id")?),
                time: fields.u64("end time")?,
            },
            RecordKind::MessageStart => TraceRecord::MessageStart(MessageHeader {
                id: MessageId(fields.u32("message id")?),
                source: TerminalId(fields.u32("source")?),
                destination: TerminalId(fields.u32("destination")?),
                transaction: TransactionId(fields.u64("transaction id")?),
                protocol_class: fields.u32("protocol class")?,
                min_hop_count: fields.u32("minimal hop count")?,
                opcode: fields.u32("opcode")?,
            }),
            RecordKind::MessageEnd => TraceRecord::MessageEnd,
            RecordKind::PacketStart => TraceRecord::PacketStart {
                id: PacketId(fields.u32("packet id")?),
                hop_count: fields.u32("hop count")?,
            },
            RecordKind::PacketEnd => TraceRecord::PacketEnd,
            RecordKind::Flit => TraceRecord::Flit {
                id: FlitId(fields.u32("flit id")?),
                send_time: fields.u64("send time")?,
                receive_time: fields.u64("receive time")?,
            },
        };

        fields.finish()?;
        Ok(Some(record))
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            TraceRecord::TransactionStart { .. } => RecordKind::TransactionStart,
            TraceRecord::TransactionEnd { .. } => RecordKind::TransactionEnd,
            TraceRecord::MessageStart(_) => RecordKind::MessageStart,
            TraceRecord::MessageEnd => RecordKind::MessageEnd,
            TraceRecord::PacketStart { .. } => RecordKind::PacketStart,
            TraceRecord::PacketEnd => RecordKind::PacketEnd,
            TraceRecord::Flit { .. } => RecordKind::Flit,
        }
    }
}

/// Parse an unsigned integer in decimal or `0x`-prefixed hexadecimal.
pub fn parse_u64(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Cursor over the remaining comma separated tokens of one record.
struct Fields<'a> {
    kind: RecordKind,
    tokens: std::str::Split<'a, char>,
}

impl Fields<'_> {
    fn next(&mut self, field: &'static str) -> Result<&str, RecordError> {
        match self.tokens.next().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(RecordError::MissingField {
                kind: self.kind.tag(),
                field,
            }),
        }
    }

    fn u64(&mut self, field: &'static str) -> Result<u64, RecordError> {
        let token = self.next(field)?;
        parse_u64(token).ok_or_else(|| RecordError::InvalidNumber {
            field,
            value: token.to_string(),
        })
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, RecordError> {
        let token = self.next(field)?;
        parse_u64(token)
            .and_then(|value| u32::try_from(value).ok())
            .ok_or_else(|| RecordError::InvalidNumber {
                field,
                value: token.to_string(),
            })
    }

    /// Reject leftover tokens. A single trailing empty token (a line ending
    /// in a comma) is tolerated.
    fn finish(mut self) -> Result<(), RecordError> {
        let extra = match (self.tokens.next(), self.tokens.next()) {
            (None, _) => return Ok(()),
            (Some(token), None) if token.trim().is_empty() => return Ok(()),
            (Some(token), None) => token,
            (Some(token), Some(next)) => {
                if token.trim().is_empty() {
                    next
                } else {
                    token
                }
            }
        };
        Err(RecordError::TrailingFields {
            kind: self.kind.tag(),
            extra: extra.trim().to_string(),
        })
    }
}
