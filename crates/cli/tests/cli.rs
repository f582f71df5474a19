use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Output};

const TRACE: &str = "\
+T,0,0
+M,0,3,7,0,0,2,1
+P,0,2
F,0,1,4
F,1,2,6
-P
+P,1,4
F,0,3,8
F,1,4,11
F,2,5,9
-P
-M
+T,72057594037927936,5
+M,1,12,2,72057594037927936,1,1,0
+P,0,1
F,0,6,9
-P
-M
+M,2,4,5,0,0,3,1
+P,0,3
F,0,9,15
-P
-M
-T,0,16
-T,72057594037927936,12
";

fn ssparse(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ssparse"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute ssparse")
}

fn write_trace(dir: &Path, contents: &str) {
    fs::write(dir.join("trace.log"), contents).unwrap();
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn count_column(report: &str, label: &str) -> String {
    report
        .lines()
        .find(|line| line.starts_with(&format!("{label},")))
        .and_then(|line| line.split(',').nth(1))
        .unwrap_or_else(|| panic!("no {label} row in:\n{report}"))
        .to_string()
}

#[test]
fn test_parse_writes_reports() {
    let dir = tempfile::tempdir().unwrap();
    write_trace(dir.path(), TRACE);

    let output = ssparse(
        &["parse", "trace.log", "-l", "latency.csv", "-c", "hops.csv", "-p", "packets.csv"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr={}", stderr(&output));

    let latency = fs::read_to_string(dir.path().join("latency.csv")).unwrap();
    assert!(latency.starts_with("Type,Count,Minimum,Maximum,Median,"));
    assert_eq!(count_column(&latency, "Packet"), "4");
    assert_eq!(count_column(&latency, "Message"), "3");
    assert_eq!(count_column(&latency, "Transaction"), "2");

    let hops = fs::read_to_string(dir.path().join("hops.csv")).unwrap();
    assert!(hops.starts_with("Type,AveHops,"));
    assert!(hops.lines().nth(1).unwrap().starts_with("Packet,2.500000,"));

    let packets = fs::read_to_string(dir.path().join("packets.csv")).unwrap();
    assert_eq!(packets.lines().count(), 4);

    let summary = String::from_utf8_lossy(&output.stdout);
    assert!(summary.contains("Latency Report"));
}

#[test]
fn test_quiet_suppresses_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_trace(dir.path(), TRACE);

    let output = ssparse(&["parse", "trace.log", "-q"], dir.path());
    assert!(output.status.success(), "stderr={}", stderr(&output));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_corrupted_trace_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_trace(dir.path(), "+T,5,0\n+M,1,0,1,5,0,0,0\n+M,1,0,1,5,0,0,0\n");

    let output = ssparse(&["parse", "trace.log", "-l", "latency.csv"], dir.path());
    assert!(!output.status.success());
    let message = stderr(&output);
    assert!(message.contains("line 3"), "stderr={message}");
    assert!(message.contains("likely corrupted"), "stderr={message}");
}

#[test]
fn test_missing_trace_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = ssparse(&["parse", "absent.log"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to open trace file"));
}

#[test]
fn test_exclusion_filter() {
    let dir = tempfile::tempdir().unwrap();
    write_trace(dir.path(), TRACE);

    let output = ssparse(
        &["parse", "trace.log", "-l", "latency.csv", "-f", "-app=1"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr={}", stderr(&output));

    let latency = fs::read_to_string(dir.path().join("latency.csv")).unwrap();
    assert_eq!(count_column(&latency, "Transaction"), "1");
    assert_eq!(count_column(&latency, "Packet"), "3");
}

#[test]
fn test_invalid_filter_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_trace(dir.path(), TRACE);

    let output = ssparse(&["parse", "trace.log", "-f", "+colour=1"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid engine configuration"));
}

#[test]
fn test_config_file() {
    let dir = tempfile::tempdir().unwrap();
    write_trace(dir.path(), TRACE);
    fs::write(
        dir.path().join("ssparse.toml"),
        r#"
[engine]
scalar = 2.0
filters = ["+app=0"]

[output]
latency = "from-config.csv"
"#,
    )
    .unwrap();

    let output = ssparse(
        &["parse", "trace.log", "--config", "ssparse.toml", "-q"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr={}", stderr(&output));

    let latency = fs::read_to_string(dir.path().join("from-config.csv")).unwrap();
    assert_eq!(count_column(&latency, "Transaction"), "1");
    // Transaction 0 runs 0..16, doubled by the scalar.
    let row = latency
        .lines()
        .find(|line| line.starts_with("Transaction,"))
        .unwrap();
    assert_eq!(row.split(',').nth(2), Some("32.000000"));
}

#[test]
fn test_transient_output() {
    let dir = tempfile::tempdir().unwrap();
    write_trace(dir.path(), TRACE);

    let output = ssparse(
        &["transient", "trace.log", "transient.csv", "-b", "2"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr={}", stderr(&output));

    let grid = fs::read_to_string(dir.path().join("transient.csv")).unwrap();
    let lines: Vec<&str> = grid.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Time,"));
    assert!(lines[1].starts_with("1.000000,"));
    assert!(lines[2].starts_with("8.000000,"));
}

#[test]
fn test_transient_rejects_time_filter() {
    let dir = tempfile::tempdir().unwrap();
    write_trace(dir.path(), TRACE);

    let output = ssparse(
        &["transient", "trace.log", "transient.csv", "-f", "+send=0-5"],
        dir.path(),
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid transient configuration"));
    assert!(!dir.path().join("transient.csv").exists());
}

#[test]
fn test_parse_gzipped_trace() {
    let dir = tempfile::tempdir().unwrap();
    let mut encoder = GzEncoder::new(
        File::create(dir.path().join("trace.mpf.gz")).unwrap(),
        Compression::default(),
    );
    encoder.write_all(TRACE.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let output = ssparse(
        &["parse", "trace.mpf.gz", "-l", "latency.csv", "-q"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr={}", stderr(&output));

    let latency = fs::read_to_string(dir.path().join("latency.csv")).unwrap();
    assert_eq!(count_column(&latency, "Packet"), "4");
    assert_eq!(count_column(&latency, "Transaction"), "2");
}

#[test]
fn test_gzipped_outputs() {
    let dir = tempfile::tempdir().unwrap();
    write_trace(dir.path(), TRACE);

    let output = ssparse(
        &["parse", "trace.log", "-l", "latency.csv.gz", "-q"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr={}", stderr(&output));
    let output = ssparse(
        &["transient", "trace.log", "transient.csv.gz", "-b", "2"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr={}", stderr(&output));

    let decompress = |name: &str| {
        let mut text = String::new();
        GzDecoder::new(File::open(dir.path().join(name)).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        text
    };
    assert_eq!(count_column(&decompress("latency.csv.gz"), "Packet"), "4");
    assert_eq!(decompress("transient.csv.gz").lines().count(), 3);
}
