//! The reconstruction engine.
//!
//! Records are applied one at a time in trace order. Each close record
//! validates the unit, runs the filter chain over its summary, records the
//! latency of accepted units and folds the unit's timing into its parent.
//!
//! ```text
//!   flit ──► packet ──► message ──► transaction
//!            head send   min start   start from +T
//!            tail recv   max end     max end, then -T
//! ```

use crate::sink::{write_to, Sinks};
use crate::state::{HeadFlit, MessageState, Nesting, PacketState, TransactionState};
use crate::{ConfigError, EngineConfig, EngineError, EngineReport, RejectedCounts};
use ssparse_filter::FilterChain;
use ssparse_stats::{csv, HopCountAccumulator, OrderStatistics};
use ssparse_types::{
    FlitId, MessageHeader, PacketId, RecordKind, TraceRecord, TransactionId,
};
use std::collections::HashMap;
use tracing::{debug, info, trace, warn};

/// Streaming reconstruction of one trace.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    filters: FilterChain,
    sinks: Sinks,
    transactions: HashMap<TransactionId, TransactionState>,
    nesting: Nesting,
    transaction_latencies: Vec<f64>,
    message_latencies: Vec<f64>,
    packet_latencies: Vec<f64>,
    hop_counts: HopCountAccumulator,
    rejected: RejectedCounts,
}

impl Engine {
    /// Compile the configuration and take ownership of the sinks.
    pub fn new(config: EngineConfig, sinks: Sinks) -> Result<Self, ConfigError> {
        let filters = config.compile()?;
        Ok(Self::with_filters(config, filters, sinks))
    }

    /// Build an engine around an already compiled filter chain.
    ///
    /// `config.filters` is ignored; the scalar is still validated by the
    /// caller's [`EngineConfig::validate`].
    pub(crate) fn with_filters(config: EngineConfig, filters: FilterChain, sinks: Sinks) -> Self {
        let hop_counts = HopCountAccumulator::new(config.track_minimal_hops);
        Self {
            config,
            filters,
            sinks,
            transactions: HashMap::new(),
            nesting: Nesting::Idle,
            transaction_latencies: Vec::new(),
            message_latencies: Vec::new(),
            packet_latencies: Vec::new(),
            hop_counts,
            rejected: RejectedCounts::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn open_transactions(&self) -> usize {
        self.transactions.len()
    }

    fn scale(&self, raw: u64) -> f64 {
        raw as f64 * self.config.scalar
    }

    /// Dispatch one decoded record.
    pub fn apply(&mut self, record: TraceRecord) -> Result<(), EngineError> {
        match record {
            TraceRecord::TransactionStart { id, time } => self.transaction_start(id, time),
            TraceRecord::TransactionEnd { id, time } => self.transaction_end(id, time),
            TraceRecord::MessageStart(header) => self.message_start(header),
            TraceRecord::MessageEnd => self.message_end(),
            TraceRecord::PacketStart { id, hop_count } => self.packet_start(id, hop_count),
            TraceRecord::PacketEnd => self.packet_end(),
            TraceRecord::Flit {
                id,
                send_time,
                receive_time,
            } => self.flit(id, send_time, receive_time),
        }
    }

    pub fn transaction_start(&mut self, id: TransactionId, time: u64) -> Result<(), EngineError> {
        if self.transactions.contains_key(&id) {
            return Err(EngineError::DuplicateTransaction(id));
        }
        let start = self.scale(time);
        self.transactions.insert(id, TransactionState::new(start));
        Ok(())
    }

    pub fn transaction_end(&mut self, id: TransactionId, time: u64) -> Result<(), EngineError> {
        let end = self.scale(time);
        let state = self
            .transactions
            .get(&id)
            .ok_or(EngineError::UnknownTransaction(id))?;
        if self
            .nesting
            .message()
            .is_some_and(|message| message.header.transaction == id)
        {
            return Err(EngineError::TransactionClosedWithOpenMessage(id));
        }
        if end < state.end {
            return Err(EngineError::TransactionEndedEarly {
                id,
                end,
                latest: state.end,
            });
        }
        if end < state.start {
            return Err(EngineError::TimeReversed {
                unit: "transaction",
                start: state.start,
                end,
            });
        }

        let Some(mut state) = self.transactions.remove(&id) else {
            return Err(EngineError::UnknownTransaction(id));
        };
        state.end = end;
        let summary = state.summary(id);
        let accepted = self.filters.transaction(&summary);
        debug!(
            transaction = %id,
            latency = summary.latency(),
            accepted,
            "Transaction closed"
        );
        if accepted {
            self.transaction_latencies.push(summary.latency());
            write_to(
                &mut self.sinks.transactions,
                &csv::detail_line(summary.start, summary.end),
            )?;
        } else {
            self.rejected.transactions += 1;
        }
        Ok(())
    }

    pub fn message_start(&mut self, header: MessageHeader) -> Result<(), EngineError> {
        if let Some(open) = self.nesting.message() {
            return Err(EngineError::MessageAlreadyOpen {
                open: open.header.id,
                new: header.id,
            });
        }
        let transaction = self
            .transactions
            .get_mut(&header.transaction)
            .ok_or(EngineError::UnknownTransaction(header.transaction))?;
        transaction.message_count += 1;
        self.nesting = Nesting::Message(MessageState::new(header));
        Ok(())
    }

    pub fn message_end(&mut self) -> Result<(), EngineError> {
        let message = match std::mem::take(&mut self.nesting) {
            Nesting::Message(message) => message,
            Nesting::Idle => {
                return Err(EngineError::NoOpenMessage {
                    record: RecordKind::MessageEnd,
                })
            }
            Nesting::Packet(message, packet) => {
                let open = packet.id;
                self.nesting = Nesting::Packet(message, packet);
                return Err(EngineError::PacketStillOpen(open));
            }
        };

        let header = message.header;
        if message.packet_count == 0 {
            return Err(EngineError::EmptyMessage(header.id));
        }
        let transaction_start = self
            .transactions
            .get(&header.transaction)
            .map(|transaction| transaction.start)
            .ok_or(EngineError::UnknownTransaction(header.transaction))?;
        if message.start < transaction_start {
            return Err(EngineError::MessageBeforeTransaction {
                message: header.id,
                transaction: header.transaction,
            });
        }
        if message.end < message.start {
            return Err(EngineError::TimeReversed {
                unit: "message",
                start: message.start,
                end: message.end,
            });
        }

        let summary = message.summary();
        let accepted = self.filters.message(&summary);
        debug!(
            message = %header.id,
            transaction = %header.transaction,
            latency = summary.latency(),
            accepted,
            "Message closed"
        );
        if accepted {
            self.message_latencies.push(summary.latency());
            write_to(
                &mut self.sinks.messages,
                &csv::detail_line(summary.start, summary.end),
            )?;
        } else {
            self.rejected.messages += 1;
        }

        if let Some(transaction) = self.transactions.get_mut(&header.transaction) {
            transaction.end = transaction.end.max(message.end);
        }
        Ok(())
    }

    pub fn packet_start(&mut self, id: PacketId, hop_count: u32) -> Result<(), EngineError> {
        let mut message = match std::mem::take(&mut self.nesting) {
            Nesting::Message(message) => message,
            Nesting::Idle => {
                return Err(EngineError::NoOpenMessage {
                    record: RecordKind::PacketStart,
                })
            }
            Nesting::Packet(message, open) => {
                let open_id = open.id;
                self.nesting = Nesting::Packet(message, open);
                return Err(EngineError::PacketAlreadyOpen { open: open_id, new: id });
            }
        };

        let non_min_hop_count = if self.config.track_minimal_hops {
            hop_count.saturating_sub(message.header.min_hop_count)
        } else {
            0
        };
        match self.transactions.get_mut(&message.header.transaction) {
            Some(transaction) => transaction.packet_count += 1,
            None => {
                let transaction = message.header.transaction;
                self.nesting = Nesting::Message(message);
                return Err(EngineError::UnknownTransaction(transaction));
            }
        }
        message.packet_count += 1;
        self.nesting = Nesting::Packet(message, PacketState::new(id, hop_count, non_min_hop_count));
        Ok(())
    }

    pub fn packet_end(&mut self) -> Result<(), EngineError> {
        let (mut message, packet) = match std::mem::take(&mut self.nesting) {
            Nesting::Packet(message, packet) => (message, packet),
            Nesting::Idle => {
                return Err(EngineError::NoOpenMessage {
                    record: RecordKind::PacketEnd,
                })
            }
            Nesting::Message(message) => {
                self.nesting = Nesting::Message(message);
                return Err(EngineError::NoOpenPacket {
                    record: RecordKind::PacketEnd,
                });
            }
        };

        let head = packet.head.ok_or(EngineError::MissingHeadFlit(packet.id))?;
        let end = if self.config.packet_header_latency {
            head.receive
        } else {
            packet.tail_end
        };
        if end < head.send {
            return Err(EngineError::TimeReversed {
                unit: "packet",
                start: head.send,
                end,
            });
        }

        let summary = packet.summary(&message.header, head, end);
        let accepted = self.filters.packet(&summary);
        debug!(
            packet = %packet.id,
            message = %message.header.id,
            latency = summary.latency(),
            hops = packet.hop_count,
            accepted,
            "Packet closed"
        );
        if accepted {
            self.packet_latencies.push(summary.latency());
            self.hop_counts.record(
                packet.hop_count,
                message.header.min_hop_count,
                packet.non_min_hop_count,
            );
            write_to(
                &mut self.sinks.packets,
                &csv::detail_line(summary.start, summary.end),
            )?;
        } else {
            self.rejected.packets += 1;
        }

        message.start = message.start.min(head.send);
        message.end = message.end.max(packet.tail_end);
        self.nesting = Nesting::Message(message);
        Ok(())
    }

    pub fn flit(&mut self, id: FlitId, send_time: u64, receive_time: u64) -> Result<(), EngineError> {
        if receive_time < send_time {
            return Err(EngineError::FlitReceivedBeforeSent {
                flit: id,
                send: send_time,
                receive: receive_time,
            });
        }
        let send = self.scale(send_time);
        let receive = self.scale(receive_time);

        let (message, packet) = match &mut self.nesting {
            Nesting::Packet(message, packet) => (message, packet),
            Nesting::Idle => {
                return Err(EngineError::NoOpenMessage {
                    record: RecordKind::Flit,
                })
            }
            Nesting::Message(_) => {
                return Err(EngineError::NoOpenPacket {
                    record: RecordKind::Flit,
                })
            }
        };

        if id.is_head() {
            packet.head = Some(HeadFlit { send, receive });
        } else {
            match packet.head {
                Some(head) if send >= head.send => {}
                _ => {
                    return Err(EngineError::FlitBeforeHead {
                        packet: packet.id,
                        flit: id,
                    })
                }
            }
        }
        packet.tail_end = packet.tail_end.max(receive);
        packet.flit_count += 1;
        message.flit_count += 1;
        if let Some(transaction) = self.transactions.get_mut(&message.header.transaction) {
            transaction.flit_count += 1;
        }
        trace!(flit = %id, packet = %packet.id, send, receive, "Flit");
        Ok(())
    }

    /// Finish the run: verify nothing is left open, then produce and write
    /// the aggregate reports.
    pub fn complete(mut self) -> Result<EngineReport, EngineError> {
        let message_open = self.nesting.message().is_some();
        let packet_open = self.nesting.packet().is_some();
        if !self.transactions.is_empty() || message_open || packet_open {
            return Err(EngineError::Incomplete {
                open_transactions: self.transactions.len(),
                message_open,
                packet_open,
            });
        }

        for (class, accepted, rejected) in [
            (
                "transaction",
                self.transaction_latencies.len(),
                self.rejected.transactions,
            ),
            ("message", self.message_latencies.len(), self.rejected.messages),
            ("packet", self.packet_latencies.len(), self.rejected.packets),
        ] {
            if accepted == 0 && rejected > 0 {
                warn!(class, rejected, "Filters discarded every unit of this class");
            }
        }

        let report = EngineReport {
            transactions: OrderStatistics::from_samples(std::mem::take(
                &mut self.transaction_latencies,
            )),
            messages: OrderStatistics::from_samples(std::mem::take(&mut self.message_latencies)),
            packets: OrderStatistics::from_samples(std::mem::take(&mut self.packet_latencies)),
            hop_counts: self.hop_counts.report(),
            rejected: self.rejected,
        };

        if report.has_latencies() {
            write_to(&mut self.sinks.latency, &report.latency_csv())?;
        }
        if let Some(hop_csv) = report.hop_count_csv() {
            write_to(&mut self.sinks.hop_counts, &hop_csv)?;
        }
        self.sinks.flush()?;

        info!(
            transactions = report.transactions.count,
            messages = report.messages.count,
            packets = report.packets.count,
            rejected_transactions = report.rejected.transactions,
            rejected_messages = report.rejected.messages,
            rejected_packets = report.rejected.packets,
            "Trace reconstruction complete"
        );
        Ok(report)
    }
}
