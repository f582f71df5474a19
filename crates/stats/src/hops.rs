//! Hop-count distributions over accepted packets.
//!
//! Three axes are tracked per packet:
//!
//! ```text
//! hops          hop count actually taken
//! min hops      minimal hop count of the enclosing message
//! non-min hops  max(0, hops - min hops)
//! ```
//!
//! A packet whose non-minimal excess is zero took a minimal path. All
//! fractions use the total accepted packet count as denominator.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
struct Histogram {
    counts: BTreeMap<u32, u64>,
    sum: u64,
}

impl Histogram {
    fn add(&mut self, value: u32) {
        *self.counts.entry(value).or_insert(0) += 1;
        self.sum += u64::from(value);
    }

    fn distribution(&self, population: u64) -> HopDistribution {
        let population = population as f64;
        HopDistribution {
            average: self.sum as f64 / population,
            fractions: self
                .counts
                .iter()
                .map(|(&value, &count)| (value, count as f64 / population))
                .collect(),
        }
    }
}

/// Average and per-value fractions of one hop-count axis.
#[derive(Debug, Clone, PartialEq)]
pub struct HopDistribution {
    pub average: f64,
    /// `(hop count, fraction of packets)` for every populated value, ascending.
    pub fractions: Vec<(u32, f64)>,
}

/// Minimal-routing breakdown, present when minimal tracking is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimalHopReport {
    pub minimal_packets: u64,
    pub non_minimal_packets: u64,
    pub fraction_minimal: f64,
    pub fraction_non_minimal: f64,
    pub min_hops: HopDistribution,
    pub non_min_hops: HopDistribution,
}

/// Final hop-count report.
#[derive(Debug, Clone, PartialEq)]
pub struct HopCountReport {
    pub packets: u64,
    pub hops: HopDistribution,
    pub minimal: Option<MinimalHopReport>,
}

impl HopCountReport {
    /// Named report columns, in output order.
    pub fn columns(&self) -> Vec<(String, f64)> {
        let mut columns = vec![("AveHops".to_string(), self.hops.average)];
        columns.extend(
            self.hops
                .fractions
                .iter()
                .map(|(hops, fraction)| (format!("PerHops{hops}"), *fraction)),
        );

        if let Some(minimal) = &self.minimal {
            columns.push(("AveMinHops".to_string(), minimal.min_hops.average));
            columns.push(("PerMinimal".to_string(), minimal.fraction_minimal));
            columns.extend(
                minimal
                    .min_hops
                    .fractions
                    .iter()
                    .map(|(hops, fraction)| (format!("PerMinHops{hops}"), *fraction)),
            );
            columns.push(("AveNonMinHops".to_string(), minimal.non_min_hops.average));
            columns.push(("PerNonMinimal".to_string(), minimal.fraction_non_minimal));
            columns.extend(
                minimal
                    .non_min_hops
                    .fractions
                    .iter()
                    .map(|(hops, fraction)| (format!("PerNonMinHops{hops}"), *fraction)),
            );
        }
        columns
    }
}

/// Accumulates hop counts of accepted packets.
#[derive(Debug, Clone, Default)]
pub struct HopCountAccumulator {
    track_minimal: bool,
    packets: u64,
    minimal_packets: u64,
    non_minimal_packets: u64,
    hops: Histogram,
    min_hops: Histogram,
    non_min_hops: Histogram,
}

impl HopCountAccumulator {
    pub fn new(track_minimal: bool) -> Self {
        Self {
            track_minimal,
            ..Self::default()
        }
    }

    pub fn record(&mut self, hop_count: u32, min_hop_count: u32, non_min_hop_count: u32) {
        self.packets += 1;
        self.hops.add(hop_count);
        if self.track_minimal {
            self.min_hops.add(min_hop_count);
            self.non_min_hops.add(non_min_hop_count);
            if non_min_hop_count == 0 {
                self.minimal_packets += 1;
            } else {
                self.non_minimal_packets += 1;
            }
        }
    }

    pub fn packets(&self) -> u64 {
        self.packets
    }

    pub fn tracks_minimal(&self) -> bool {
        self.track_minimal
    }

    /// Derive the report, `None` if no packet was recorded.
    pub fn report(&self) -> Option<HopCountReport> {
        if self.packets == 0 {
            return None;
        }
        let total = self.packets as f64;
        let minimal = self.track_minimal.then(|| MinimalHopReport {
            minimal_packets: self.minimal_packets,
            non_minimal_packets: self.non_minimal_packets,
            fraction_minimal: self.minimal_packets as f64 / total,
            fraction_non_minimal: self.non_minimal_packets as f64 / total,
            min_hops: self.min_hops.distribution(self.packets),
            non_min_hops: self.non_min_hops.distribution(self.packets),
        });
        Some(HopCountReport {
            packets: self.packets,
            hops: self.hops.distribution(self.packets),
            minimal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HopCountAccumulator {
        let mut acc = HopCountAccumulator::new(true);
        // (hops, min hops)
        for (hops, min) in [(2, 2), (3, 2), (2, 2), (5, 1), (1, 1), (4, 2)] {
            acc.record(hops, min, hops.saturating_sub(min));
        }
        acc
    }

    #[test]
    fn test_empty_has_no_report() {
        assert!(HopCountAccumulator::new(true).report().is_none());
    }

    #[test]
    fn test_fractions_sum_to_one() {
        let report = sample().report().unwrap();
        let minimal = report.minimal.as_ref().unwrap();
        for distribution in [&report.hops, &minimal.min_hops, &minimal.non_min_hops] {
            let sum: f64 = distribution.fractions.iter().map(|(_, f)| f).sum();
            assert!((sum - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_minimal_split_covers_all_packets() {
        let report = sample().report().unwrap();
        let minimal = report.minimal.unwrap();
        assert_eq!(report.packets, 6);
        assert_eq!(minimal.minimal_packets, 3);
        assert_eq!(minimal.non_minimal_packets, 3);
        assert_eq!(
            minimal.minimal_packets + minimal.non_minimal_packets,
            report.packets
        );
        assert!((minimal.fraction_minimal + minimal.fraction_non_minimal - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_averages() {
        let report = sample().report().unwrap();
        let minimal = report.minimal.unwrap();
        assert!((report.hops.average - 17.0 / 6.0).abs() < 1e-12);
        assert!((minimal.min_hops.average - 10.0 / 6.0).abs() < 1e-12);
        assert!((minimal.non_min_hops.average - 7.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_columns() {
        let mut acc = HopCountAccumulator::new(true);
        acc.record(3, 2, 1);
        acc.record(2, 2, 0);
        let names: Vec<String> = acc
            .report()
            .unwrap()
            .columns()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            names,
            [
                "AveHops",
                "PerHops2",
                "PerHops3",
                "AveMinHops",
                "PerMinimal",
                "PerMinHops2",
                "AveNonMinHops",
                "PerNonMinimal",
                "PerNonMinHops0",
                "PerNonMinHops1",
            ]
        );
    }

    #[test]
    fn test_without_minimal_tracking() {
        let mut acc = HopCountAccumulator::new(false);
        acc.record(4, 1, 3);
        let report = acc.report().unwrap();
        assert!(report.minimal.is_none());
        assert_eq!(
            report.columns(),
            vec![("AveHops".to_string(), 4.0), ("PerHops4".to_string(), 1.0)]
        );
    }
}
