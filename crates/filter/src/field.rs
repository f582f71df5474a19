//! Filterable fields and their spellings.

use crate::FilterError;
use std::fmt;
use std::str::FromStr;

/// Which observed value of a completed unit a filter tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    /// High byte of the transaction id.
    Application,
    Start,
    End,
    ProtocolClass,
    Opcode,
    Source,
    Destination,
    HopCount,
    MinHopCount,
    NonMinHopCount,
    MessageCount,
    PacketCount,
    FlitCount,
}

impl FilterField {
    pub const ALL: [FilterField; 13] = [
        FilterField::Application,
        FilterField::Start,
        FilterField::End,
        FilterField::ProtocolClass,
        FilterField::Opcode,
        FilterField::Source,
        FilterField::Destination,
        FilterField::HopCount,
        FilterField::MinHopCount,
        FilterField::NonMinHopCount,
        FilterField::MessageCount,
        FilterField::PacketCount,
        FilterField::FlitCount,
    ];

    /// Canonical (long) name.
    pub fn name(self) -> &'static str {
        match self {
            FilterField::Application => "application",
            FilterField::Start => "start",
            FilterField::End => "end",
            FilterField::ProtocolClass => "protocolclass",
            FilterField::Opcode => "opcode",
            FilterField::Source => "source",
            FilterField::Destination => "destination",
            FilterField::HopCount => "hopcount",
            FilterField::MinHopCount => "minhopcount",
            FilterField::NonMinHopCount => "nonminhopcount",
            FilterField::MessageCount => "messagecount",
            FilterField::PacketCount => "packetcount",
            FilterField::FlitCount => "flitcount",
        }
    }

    /// Time fields take half-open float ranges, everything else integers.
    pub fn is_time(self) -> bool {
        matches!(self, FilterField::Start | FilterField::End)
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterField {
    type Err = FilterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "application" | "app" => Ok(FilterField::Application),
            "start" | "send" => Ok(FilterField::Start),
            "end" | "recv" => Ok(FilterField::End),
            "protocolclass" | "pc" | "trafficclass" | "tc" => Ok(FilterField::ProtocolClass),
            "opcode" | "op" => Ok(FilterField::Opcode),
            "source" | "src" => Ok(FilterField::Source),
            "destination" | "dst" => Ok(FilterField::Destination),
            "hopcount" | "hc" => Ok(FilterField::HopCount),
            "minhopcount" | "mhc" => Ok(FilterField::MinHopCount),
            "nonminhopcount" | "nmhc" => Ok(FilterField::NonMinHopCount),
            "messagecount" | "msgcnt" => Ok(FilterField::MessageCount),
            "packetcount" | "pktcnt" => Ok(FilterField::PacketCount),
            "flitcount" | "flitcnt" => Ok(FilterField::FlitCount),
            _ => Err(FilterError::UnknownField(raw.to_string())),
        }
    }
}
