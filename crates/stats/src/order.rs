//! Order statistics over a complete latency sample.

/// Index of quantile `p` (in `[0, 1]`) within a sorted sample of `len` values.
///
/// Uses `round((len - 1) * p)` with halves rounded away from zero, clamped
/// into the sample. `len` must be non-zero.
pub fn percentile_index(len: usize, p: f64) -> usize {
    debug_assert!(len > 0);
    let last = len.saturating_sub(1);
    let index = (last as f64 * p).round();
    if index.is_nan() || index <= 0.0 {
        0
    } else {
        (index as usize).min(last)
    }
}

/// Quantile `p` of an ascending sample, `None` when the sample is empty.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted[percentile_index(sorted.len(), p)])
}

/// Summary of one latency sample.
///
/// Every statistic is NaN when the sample is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderStatistics {
    pub count: usize,
    pub minimum: f64,
    pub maximum: f64,
    pub median: f64,
    pub p90: f64,
    pub p99: f64,
    pub p999: f64,
    pub p9999: f64,
    pub p99999: f64,
    pub mean: f64,
    /// Population variance (divides by N).
    pub variance: f64,
    pub std_dev: f64,
}

impl OrderStatistics {
    pub fn empty() -> Self {
        Self {
            count: 0,
            minimum: f64::NAN,
            maximum: f64::NAN,
            median: f64::NAN,
            p90: f64::NAN,
            p99: f64::NAN,
            p999: f64::NAN,
            p9999: f64::NAN,
            p99999: f64::NAN,
            mean: f64::NAN,
            variance: f64::NAN,
            std_dev: f64::NAN,
        }
    }

    /// Sort the sample and derive every statistic from it.
    pub fn from_samples(mut samples: Vec<f64>) -> Self {
        if samples.is_empty() {
            return Self::empty();
        }
        samples.sort_by(f64::total_cmp);

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|value| {
                let delta = value - mean;
                delta * delta
            })
            .sum::<f64>()
            / n;

        let at = |p: f64| percentile(&samples, p).unwrap_or(f64::NAN);
        Self {
            count: samples.len(),
            minimum: at(0.0),
            maximum: at(1.0),
            median: at(0.5),
            p90: at(0.9),
            p99: at(0.99),
            p999: at(0.999),
            p9999: at(0.9999),
            p99999: at(0.99999),
            mean,
            variance,
            std_dev: variance.sqrt(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The statistics after `count`, in report column order.
    pub fn values(&self) -> [f64; 11] {
        [
            self.minimum,
            self.maximum,
            self.median,
            self.p90,
            self.p99,
            self.p999,
            self.p9999,
            self.p99999,
            self.mean,
            self.variance,
            self.std_dev,
        ]
    }
}

impl Default for OrderStatistics {
    fn default() -> Self {
        Self::empty()
    }
}
