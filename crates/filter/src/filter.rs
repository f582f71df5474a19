//! A single compiled filter.

use crate::{FilterError, FilterField};
use ssparse_types::{parse_u64, MessageSummary, PacketSummary, TransactionSummary};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.start && value < self.end
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Values a filter matches against.
#[derive(Debug, Clone, PartialEq)]
enum Matcher {
    Times(Vec<TimeRange>),
    /// Disjoint inclusive ranges; together they form the accepted value set.
    Values(Vec<RangeInclusive<u64>>),
}

/// One compiled acceptance predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    description: String,
    accept: bool,
    field: FilterField,
    matcher: Matcher,
}

impl Filter {
    /// Compile a filter specification such as `+app=0-9,12` or `-send=100-200`.
    pub fn parse(description: &str) -> Result<Self, FilterError> {
        let accept = match description.chars().next() {
            Some('+') => true,
            Some('-') => false,
            Some(other) => return Err(FilterError::InvalidPolarity(other)),
            None => return Err(FilterError::Empty),
        };

        let body = &description[1..];
        let mut halves = body.split('=');
        let (field, ranges) = match (halves.next(), halves.next(), halves.next()) {
            (Some(field), Some(ranges), None) => (field, ranges),
            _ => return Err(FilterError::InvalidFormat(description.to_string())),
        };
        let field = FilterField::from_str(field)?;

        let matcher = if field.is_time() {
            Matcher::Times(parse_time_ranges(ranges)?)
        } else {
            Matcher::Values(parse_value_ranges(ranges)?)
        };

        Ok(Self {
            description: description.to_string(),
            accept,
            field,
            matcher,
        })
    }

    /// Build a filter accepting a single time window of `field`.
    pub fn accept_window(field: FilterField, window: TimeRange) -> Result<Self, FilterError> {
        if !field.is_time() {
            return Err(FilterError::NotTimeField(field.name()));
        }
        let TimeRange { start, end } = window;
        if !start.is_finite() || !end.is_finite() || start > end {
            return Err(FilterError::ReversedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            description: format!("+{}={}-{}", field.name(), start, end),
            accept: true,
            field,
            matcher: Matcher::Times(vec![window]),
        })
    }

    /// The specification this filter was compiled from.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn field(&self) -> FilterField {
        self.field
    }

    /// Whether matching units are retained (`+`) or discarded (`-`).
    pub fn accepts_matches(&self) -> bool {
        self.accept
    }

    /// Decide whether a closed transaction is retained.
    pub fn transaction(&self, unit: &TransactionSummary) -> bool {
        match self.field {
            FilterField::Application => self.check_value(unit.application().into()),
            FilterField::Start => self.check_time(unit.start),
            FilterField::End => self.check_time(unit.end),
            FilterField::MessageCount => self.check_value(unit.message_count.into()),
            FilterField::PacketCount => self.check_value(unit.packet_count.into()),
            FilterField::FlitCount => self.check_value(unit.flit_count.into()),
            FilterField::ProtocolClass
            | FilterField::Opcode
            | FilterField::Source
            | FilterField::Destination
            | FilterField::HopCount
            | FilterField::MinHopCount
            | FilterField::NonMinHopCount => true,
        }
    }

    /// Decide whether a closed message is retained.
    pub fn message(&self, unit: &MessageSummary) -> bool {
        match self.field {
            FilterField::Application => self.check_value(unit.application().into()),
            FilterField::Start => self.check_time(unit.start),
            FilterField::End => self.check_time(unit.end),
            FilterField::ProtocolClass => self.check_value(unit.protocol_class.into()),
            FilterField::Opcode => self.check_value(unit.opcode.into()),
            FilterField::Source => self.check_value(unit.source.0.into()),
            FilterField::Destination => self.check_value(unit.destination.0.into()),
            FilterField::MinHopCount => self.check_value(unit.min_hop_count.into()),
            FilterField::PacketCount => self.check_value(unit.packet_count.into()),
            FilterField::FlitCount => self.check_value(unit.flit_count.into()),
            FilterField::HopCount | FilterField::NonMinHopCount | FilterField::MessageCount => {
                true
            }
        }
    }

    /// Decide whether a closed packet is retained.
    pub fn packet(&self, unit: &PacketSummary) -> bool {
        match self.field {
            FilterField::Application => self.check_value(unit.application().into()),
            FilterField::Start => self.check_time(unit.start),
            FilterField::End => self.check_time(unit.end),
            FilterField::ProtocolClass => self.check_value(unit.protocol_class.into()),
            FilterField::Opcode => self.check_value(unit.opcode.into()),
            FilterField::Source => self.check_value(unit.source.0.into()),
            FilterField::Destination => self.check_value(unit.destination.0.into()),
            FilterField::FlitCount => self.check_value(unit.flit_count.into()),
            FilterField::HopCount => self.check_value(unit.hop_count.into()),
            FilterField::MinHopCount => self.check_value(unit.min_hop_count.into()),
            FilterField::NonMinHopCount => self.check_value(unit.non_min_hop_count.into()),
            FilterField::MessageCount | FilterField::PacketCount => true,
        }
    }

    fn check_value(&self, value: u64) -> bool {
        let matched = match &self.matcher {
            Matcher::Values(ranges) => ranges.iter().any(|range| range.contains(&value)),
            Matcher::Times(_) => false,
        };
        self.accept == matched
    }

    fn check_time(&self, value: f64) -> bool {
        let matched = match &self.matcher {
            Matcher::Times(ranges) => ranges.iter().any(|range| range.contains(value)),
            Matcher::Values(_) => false,
        };
        self.accept == matched
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Filter::parse(raw)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Split one comma separated entry into its `first[-last]` parts.
fn split_entry(entry: &str) -> Result<Vec<&str>, FilterError> {
    let parts: Vec<&str> = entry.split('-').map(str::trim).collect();
    if parts.len() > 2 || parts.iter().any(|part| part.is_empty()) {
        return Err(FilterError::InvalidRange(entry.to_string()));
    }
    Ok(parts)
}

fn parse_time_ranges(spec: &str) -> Result<Vec<TimeRange>, FilterError> {
    let mut ranges: Vec<TimeRange> = Vec::new();
    for entry in spec.split(',') {
        let parts = split_entry(entry)?;
        let [start, end] = parts[..] else {
            return Err(FilterError::TimeRangeRequired(entry.to_string()));
        };
        let range = TimeRange {
            start: parse_time(start)?,
            end: parse_time(end)?,
        };
        if range.start > range.end {
            return Err(FilterError::ReversedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        if ranges.iter().any(|existing| existing.overlaps(&range)) {
            return Err(FilterError::OverlappingRange(entry.to_string()));
        }
        ranges.push(range);
    }
    Ok(ranges)
}

fn parse_time(raw: &str) -> Result<f64, FilterError> {
    let value: f64 = raw
        .parse()
        .map_err(|_| FilterError::InvalidNumber(raw.to_string()))?;
    if !value.is_finite() {
        return Err(FilterError::InvalidNumber(raw.to_string()));
    }
    if value < 0.0 {
        return Err(FilterError::NegativeTime(value));
    }
    Ok(value)
}

fn parse_value_ranges(spec: &str) -> Result<Vec<RangeInclusive<u64>>, FilterError> {
    let mut ranges: Vec<RangeInclusive<u64>> = Vec::new();
    for entry in spec.split(',') {
        let parts = split_entry(entry)?;
        let range = match parts[..] {
            [single] => {
                let value = parse_value(single)?;
                value..=value
            }
            [first, last] => {
                let (start, end) = (parse_value(first)?, parse_value(last)?);
                if start > end {
                    return Err(FilterError::ReversedRange {
                        start: first.to_string(),
                        end: last.to_string(),
                    });
                }
                start..=end
            }
            _ => return Err(FilterError::InvalidRange(entry.to_string())),
        };
        if let Some(existing) = ranges
            .iter()
            .find(|existing| existing.start() <= range.end() && range.start() <= existing.end())
        {
            let first_duplicate = *existing.start().max(range.start());
            return Err(FilterError::DuplicateValue(first_duplicate));
        }
        ranges.push(range);
    }
    Ok(ranges)
}

fn parse_value(raw: &str) -> Result<u64, FilterError> {
    parse_u64(raw).ok_or_else(|| FilterError::InvalidNumber(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssparse_types::{MessageId, PacketId, TerminalId, TransactionId};

    const RANGES: &str = "0-9,10-18,100-250";

    fn transaction() -> TransactionSummary {
        TransactionSummary {
            id: TransactionId(0),
            start: 0.0,
            end: 0.0,
            message_count: 0,
            packet_count: 0,
            flit_count: 0,
        }
    }

    fn message() -> MessageSummary {
        MessageSummary {
            id: MessageId(0),
            transaction: TransactionId(0),
            source: TerminalId(0),
            destination: TerminalId(0),
            protocol_class: 0,
            opcode: 0,
            min_hop_count: 0,
            start: 0.0,
            end: 0.0,
            packet_count: 0,
            flit_count: 0,
        }
    }

    fn packet() -> PacketSummary {
        PacketSummary {
            id: PacketId(0),
            transaction: TransactionId(0),
            source: TerminalId(0),
            destination: TerminalId(0),
            protocol_class: 0,
            opcode: 0,
            min_hop_count: 0,
            start: 0.0,
            end: 0.0,
            flit_count: 0,
            hop_count: 0,
            non_min_hop_count: 0,
        }
    }

    /// Integer probe values and whether they fall inside [`RANGES`].
    const VALUE_PROBES: [(u64, bool); 4] = [(18, true), (19, false), (100, true), (99, false)];

    #[test]
    fn test_plus_and_minus_application() {
        for (polarity, accept) in [('+', true), ('-', false)] {
            let filter = Filter::parse(&format!("{polarity}app={RANGES}")).unwrap();
            assert_eq!(filter.description(), format!("{polarity}app={RANGES}"));
            for (value, inside) in VALUE_PROBES {
                let id = TransactionId(value << 56);
                let expected = inside == accept;
                assert_eq!(
                    filter.transaction(&TransactionSummary { id, ..transaction() }),
                    expected
                );
                assert_eq!(
                    filter.message(&MessageSummary {
                        transaction: id,
                        ..message()
                    }),
                    expected
                );
                assert_eq!(
                    filter.packet(&PacketSummary {
                        transaction: id,
                        ..packet()
                    }),
                    expected
                );
            }
        }
    }

    #[test]
    fn test_plus_and_minus_start_time() {
        // 9.5 falls between ranges and 18.0 is the excluded edge of [10, 18).
        let probes = [(8.5, true), (9.5, false), (17.9, true), (18.0, false), (250.0, false)];
        for (polarity, accept) in [('+', true), ('-', false)] {
            let filter = Filter::parse(&format!("{polarity}start={RANGES}")).unwrap();
            for (time, inside) in probes {
                let expected = inside == accept;
                assert_eq!(
                    filter.transaction(&TransactionSummary {
                        start: time,
                        ..transaction()
                    }),
                    expected,
                    "{polarity}start at {time}"
                );
                assert_eq!(
                    filter.message(&MessageSummary {
                        start: time,
                        ..message()
                    }),
                    expected
                );
                assert_eq!(
                    filter.packet(&PacketSummary {
                        start: time,
                        ..packet()
                    }),
                    expected
                );
                // The end field is not the one being tested.
                assert_eq!(
                    filter.packet(&PacketSummary {
                        end: time,
                        start: 1000.0,
                        ..packet()
                    }),
                    !accept
                );
            }
        }
    }

    #[test]
    fn test_plus_and_minus_end_time() {
        for (polarity, accept) in [('+', true), ('-', false)] {
            let filter = Filter::parse(&format!("{polarity}recv={RANGES}")).unwrap();
            assert_eq!(filter.field(), FilterField::End);
            assert_eq!(
                filter.transaction(&TransactionSummary {
                    end: 150.0,
                    ..transaction()
                }),
                accept
            );
            assert_eq!(
                filter.message(&MessageSummary {
                    end: 99.0,
                    ..message()
                }),
                !accept
            );
        }
    }

    #[test]
    fn test_message_and_packet_fields() {
        type Probe = (
            &'static str,
            fn(u64) -> MessageSummary,
            fn(u64) -> PacketSummary,
        );
        let probes: [Probe; 5] = [
            (
                "pc",
                |v| MessageSummary {
                    protocol_class: v as u32,
                    ..message()
                },
                |v| PacketSummary {
                    protocol_class: v as u32,
                    ..packet()
                },
            ),
            (
                "opcode",
                |v| MessageSummary {
                    opcode: v as u32,
                    ..message()
                },
                |v| PacketSummary {
                    opcode: v as u32,
                    ..packet()
                },
            ),
            (
                "source",
                |v| MessageSummary {
                    source: TerminalId(v as u32),
                    ..message()
                },
                |v| PacketSummary {
                    source: TerminalId(v as u32),
                    ..packet()
                },
            ),
            (
                "destination",
                |v| MessageSummary {
                    destination: TerminalId(v as u32),
                    ..message()
                },
                |v| PacketSummary {
                    destination: TerminalId(v as u32),
                    ..packet()
                },
            ),
            (
                "minhopcount",
                |v| MessageSummary {
                    min_hop_count: v as u32,
                    ..message()
                },
                |v| PacketSummary {
                    min_hop_count: v as u32,
                    ..packet()
                },
            ),
        ];

        for (field, make_message, make_packet) in probes {
            for (polarity, accept) in [('+', true), ('-', false)] {
                let filter = Filter::parse(&format!("{polarity}{field}={RANGES}")).unwrap();
                for (value, inside) in VALUE_PROBES {
                    assert_eq!(filter.message(&make_message(value)), inside == accept);
                    assert_eq!(filter.packet(&make_packet(value)), inside == accept);
                }
                // Transactions carry none of these fields.
                assert!(filter.transaction(&transaction()));
            }
        }
    }

    #[test]
    fn test_packet_only_fields() {
        for field in ["hopcount", "nonminhopcount"] {
            for (polarity, accept) in [('+', true), ('-', false)] {
                let filter = Filter::parse(&format!("{polarity}{field}={RANGES}")).unwrap();
                for (value, inside) in VALUE_PROBES {
                    let unit = if field == "hopcount" {
                        PacketSummary {
                            hop_count: value as u32,
                            ..packet()
                        }
                    } else {
                        PacketSummary {
                            non_min_hop_count: value as u32,
                            ..packet()
                        }
                    };
                    assert_eq!(filter.packet(&unit), inside == accept);
                }
                assert!(filter.transaction(&transaction()));
                assert!(filter.message(&message()));
            }
        }
    }

    #[test]
    fn test_count_fields() {
        for (polarity, accept) in [('+', true), ('-', false)] {
            let messages = Filter::parse(&format!("{polarity}msgcnt={RANGES}")).unwrap();
            let packets = Filter::parse(&format!("{polarity}pktcnt={RANGES}")).unwrap();
            let flits = Filter::parse(&format!("{polarity}flitcnt={RANGES}")).unwrap();
            for (value, inside) in VALUE_PROBES {
                let value = value as u32;
                let expected = inside == accept;
                let trans = TransactionSummary {
                    message_count: value,
                    packet_count: value,
                    flit_count: value,
                    ..transaction()
                };
                assert_eq!(messages.transaction(&trans), expected);
                assert_eq!(packets.transaction(&trans), expected);
                assert_eq!(flits.transaction(&trans), expected);

                let msg = MessageSummary {
                    packet_count: value,
                    flit_count: value,
                    ..message()
                };
                assert!(messages.message(&msg));
                assert_eq!(packets.message(&msg), expected);
                assert_eq!(flits.message(&msg), expected);

                let pkt = PacketSummary {
                    flit_count: value,
                    ..packet()
                };
                assert!(messages.packet(&pkt));
                assert!(packets.packet(&pkt));
                assert_eq!(flits.packet(&pkt), expected);
            }
        }
    }

    #[test]
    fn test_inapplicable_fields_pass_regardless_of_polarity() {
        // A value that would be rejected by `+` and accepted by `-` if tested.
        for polarity in ['+', '-'] {
            for field in ["pc", "op", "src", "dst", "hc", "mhc", "nmhc"] {
                let filter = Filter::parse(&format!("{polarity}{field}=5")).unwrap();
                assert!(filter.transaction(&transaction()), "{polarity}{field}");
            }
            for field in ["hc", "nmhc", "msgcnt"] {
                let filter = Filter::parse(&format!("{polarity}{field}=5")).unwrap();
                assert!(filter.message(&message()), "{polarity}{field}");
            }
            for field in ["msgcnt", "pktcnt"] {
                let filter = Filter::parse(&format!("{polarity}{field}=5")).unwrap();
                assert!(filter.packet(&packet()), "{polarity}{field}");
            }
        }
    }

    #[test]
    fn test_integer_range_is_inclusive() {
        let filter = Filter::parse("+src=0-9").unwrap();
        let at = |v: u32| PacketSummary {
            source: TerminalId(v),
            ..packet()
        };
        assert!(filter.packet(&at(0)));
        assert!(filter.packet(&at(9)));
        assert!(!filter.packet(&at(10)));
        assert!(!filter.packet(&at(15)));
    }

    #[test]
    fn test_hex_values() {
        let filter = Filter::parse("+pc=0x10").unwrap();
        assert!(filter.message(&MessageSummary {
            protocol_class: 16,
            ..message()
        }));
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(Filter::parse(""), Err(FilterError::Empty));
        assert_eq!(
            Filter::parse("*app=1"),
            Err(FilterError::InvalidPolarity('*'))
        );
        assert!(matches!(
            Filter::parse("+app"),
            Err(FilterError::InvalidFormat(_))
        ));
        assert!(matches!(
            Filter::parse("+app=1=2"),
            Err(FilterError::InvalidFormat(_))
        ));
        assert!(matches!(
            Filter::parse("+bogus=1"),
            Err(FilterError::UnknownField(_))
        ));
        assert!(matches!(
            Filter::parse("+app=1-2-3"),
            Err(FilterError::InvalidRange(_))
        ));
        assert!(matches!(
            Filter::parse("+app=1,,2"),
            Err(FilterError::InvalidRange(_))
        ));
        assert!(matches!(
            Filter::parse("+app="),
            Err(FilterError::InvalidRange(_))
        ));
        assert!(matches!(
            Filter::parse("+app=x"),
            Err(FilterError::InvalidNumber(_))
        ));
        assert!(matches!(
            Filter::parse("+app=9-3"),
            Err(FilterError::ReversedRange { .. })
        ));
    }

    #[test]
    fn test_duplicate_values_rejected() {
        assert_eq!(
            Filter::parse("+src=1,1"),
            Err(FilterError::DuplicateValue(1))
        );
        assert_eq!(
            Filter::parse("+src=0-9,5"),
            Err(FilterError::DuplicateValue(5))
        );
        assert_eq!(
            Filter::parse("+src=5-10,0-7"),
            Err(FilterError::DuplicateValue(5))
        );
        assert!(Filter::parse("+src=0-9,10-18").is_ok());
    }

    #[test]
    fn test_time_ranges_validated() {
        assert!(matches!(
            Filter::parse("+start=5"),
            Err(FilterError::TimeRangeRequired(_))
        ));
        assert!(matches!(
            Filter::parse("+end=10-5"),
            Err(FilterError::ReversedRange { .. })
        ));
        assert!(matches!(
            Filter::parse("+send=0-10,5-15"),
            Err(FilterError::OverlappingRange(_))
        ));
        // A later range swallowing an earlier one is still an overlap.
        assert!(matches!(
            Filter::parse("+send=4-5,0-10"),
            Err(FilterError::OverlappingRange(_))
        ));
        assert!(matches!(
            Filter::parse("+send=inf-10"),
            Err(FilterError::InvalidNumber(_))
        ));
        // Touching half-open ranges do not overlap.
        assert!(Filter::parse("+send=0-10,10-20").is_ok());
        assert!(Filter::parse("+send=0.5-1.25").is_ok());
    }

    #[test]
    fn test_accept_window() {
        let window = TimeRange {
            start: 2.5,
            end: 7.75,
        };
        let filter = Filter::accept_window(FilterField::Start, window).unwrap();
        assert_eq!(filter.description(), "+start=2.5-7.75");
        assert!(filter.accepts_matches());
        assert!(filter.packet(&PacketSummary {
            start: 2.5,
            ..packet()
        }));
        assert!(!filter.packet(&PacketSummary {
            start: 7.75,
            ..packet()
        }));
    }

    #[test]
    fn test_accept_window_takes_any_finite_bounds() {
        // Bucket edges may fall just below zero after float arithmetic.
        let window = TimeRange {
            start: -5e-7,
            end: 4.5,
        };
        let filter = Filter::accept_window(FilterField::End, window).unwrap();
        assert!(filter.packet(&PacketSummary {
            end: 0.0,
            ..packet()
        }));

        assert!(matches!(
            Filter::accept_window(FilterField::HopCount, window),
            Err(FilterError::NotTimeField("hopcount"))
        ));
        let reversed = TimeRange {
            start: 3.0,
            end: 1.0,
        };
        assert!(matches!(
            Filter::accept_window(FilterField::Start, reversed),
            Err(FilterError::ReversedRange { .. })
        ));
    }
}
