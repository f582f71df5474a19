//! Output destinations owned by the engine.

use std::fmt;
use std::io::{self, Write};

type Sink = Option<Box<dyn Write>>;

/// Optional writers for every output the engine can produce.
///
/// Detail sinks receive one `start,end` line per accepted unit as it closes;
/// the aggregate sinks are written once on completion. An absent sink
/// disables that output.
#[derive(Default)]
pub struct Sinks {
    pub(crate) transactions: Sink,
    pub(crate) messages: Sink,
    pub(crate) packets: Sink,
    pub(crate) latency: Sink,
    pub(crate) hop_counts: Sink,
}

impl Sinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(mut self, writer: impl Write + 'static) -> Self {
        self.transactions = Some(Box::new(writer));
        self
    }

    pub fn with_messages(mut self, writer: impl Write + 'static) -> Self {
        self.messages = Some(Box::new(writer));
        self
    }

    pub fn with_packets(mut self, writer: impl Write + 'static) -> Self {
        self.packets = Some(Box::new(writer));
        self
    }

    /// Destination of the latency aggregate CSV.
    pub fn with_latency(mut self, writer: impl Write + 'static) -> Self {
        self.latency = Some(Box::new(writer));
        self
    }

    /// Destination of the hop-count CSV.
    pub fn with_hop_counts(mut self, writer: impl Write + 'static) -> Self {
        self.hop_counts = Some(Box::new(writer));
        self
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        for sink in [
            &mut self.transactions,
            &mut self.messages,
            &mut self.packets,
            &mut self.latency,
            &mut self.hop_counts,
        ]
        .into_iter()
        .flatten()
        {
            sink.flush()?;
        }
        Ok(())
    }
}

pub(crate) fn write_to(sink: &mut Sink, text: &str) -> io::Result<()> {
    match sink {
        Some(writer) => writer.write_all(text.as_bytes()),
        None => Ok(()),
    }
}

impl fmt::Debug for Sinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sinks")
            .field("transactions", &self.transactions.is_some())
            .field("messages", &self.messages.is_some())
            .field("packets", &self.packets.is_some())
            .field("latency", &self.latency.is_some())
            .field("hop_counts", &self.hop_counts.is_some())
            .finish()
    }
}
