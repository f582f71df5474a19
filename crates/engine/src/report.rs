//! Final results of a reconstruction run.

use ssparse_stats::{csv, HopCountReport, OrderStatistics};

/// Units discarded by the filter chain, per class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectedCounts {
    pub transactions: u64,
    pub messages: u64,
    pub packets: u64,
}

/// Aggregate statistics over the accepted units.
#[derive(Debug, Clone)]
pub struct EngineReport {
    pub transactions: OrderStatistics,
    pub messages: OrderStatistics,
    pub packets: OrderStatistics,
    /// `None` when no packet was accepted.
    pub hop_counts: Option<HopCountReport>,
    pub rejected: RejectedCounts,
}

impl EngineReport {
    /// `(label, statistics)` rows in report order.
    pub fn latency_rows(&self) -> [(&'static str, &OrderStatistics); 3] {
        [
            ("Packet", &self.packets),
            ("Message", &self.messages),
            ("Transaction", &self.transactions),
        ]
    }

    pub fn has_latencies(&self) -> bool {
        self.latency_rows().iter().any(|(_, stats)| !stats.is_empty())
    }

    /// The latency aggregate CSV.
    pub fn latency_csv(&self) -> String {
        csv::render_latency(&self.latency_rows())
    }

    /// The hop-count CSV, if any packet was accepted.
    pub fn hop_count_csv(&self) -> Option<String> {
        self.hop_counts.as_ref().map(csv::render_hop_counts)
    }

    pub fn print_summary(&self) {
        println!("\n--- Latency Report ---");
        for (label, stats) in self.latency_rows() {
            println!();
            println!("{label}s:");
            println!("  Count:  {}", stats.count);
            if stats.is_empty() {
                continue;
            }
            println!("  Min:    {:.3}", stats.minimum);
            println!("  P50:    {:.3}", stats.median);
            println!("  P90:    {:.3}", stats.p90);
            println!("  P99:    {:.3}", stats.p99);
            println!("  Max:    {:.3}", stats.maximum);
            println!("  Mean:   {:.3}", stats.mean);
            println!("  StdDev: {:.3}", stats.std_dev);
        }

        if let Some(hops) = &self.hop_counts {
            println!();
            println!("Hops:");
            println!("  Average: {:.3}", hops.hops.average);
            if let Some(minimal) = &hops.minimal {
                println!(
                    "  Minimal: {} of {} ({:.1}%)",
                    minimal.minimal_packets,
                    hops.packets,
                    minimal.fraction_minimal * 100.0
                );
            }
        }

        let rejected = self.rejected;
        if rejected != RejectedCounts::default() {
            println!();
            println!("Filtered out:");
            println!("  Transactions: {}", rejected.transactions);
            println!("  Messages:     {}", rejected.messages);
            println!("  Packets:      {}", rejected.packets);
        }
    }
}
