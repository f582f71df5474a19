//! CSV rendering of the aggregate reports.
//!
//! Numbers are written with six fractional digits; undefined values as `nan`.

use crate::{HopCountReport, OrderStatistics};

/// Header of the latency aggregate file.
pub const LATENCY_HEADER: [&str; 13] = [
    "Type",
    "Count",
    "Minimum",
    "Maximum",
    "Median",
    "90th%",
    "99th%",
    "99.9th%",
    "99.99th%",
    "99.999th%",
    "Mean",
    "Variance",
    "StdDev",
];

/// Format one statistic.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{value:.6}")
    }
}

/// Render a `start,end` detail line.
pub fn detail_line(start: f64, end: f64) -> String {
    format!("{},{}\n", format_value(start), format_value(end))
}

/// Render one latency row, without the trailing newline.
pub fn latency_row(label: &str, stats: &OrderStatistics) -> String {
    let mut row = format!("{label},{}", stats.count);
    for value in stats.values() {
        row.push(',');
        row.push_str(&format_value(value));
    }
    row
}

/// Render the full latency aggregate: header plus one row per class.
pub fn render_latency(rows: &[(&str, &OrderStatistics)]) -> String {
    let mut out = LATENCY_HEADER.join(",");
    out.push('\n');
    for (label, stats) in rows {
        out.push_str(&latency_row(label, stats));
        out.push('\n');
    }
    out
}

/// Render the hop-count report: header plus a single `Packet` row.
pub fn render_hop_counts(report: &HopCountReport) -> String {
    let columns = report.columns();
    let mut header = String::from("Type");
    let mut row = String::from("Packet");
    for (name, value) in &columns {
        header.push(',');
        header.push_str(name);
        row.push(',');
        row.push_str(&format_value(*value));
    }
    format!("{header}\n{row}\n")
}
