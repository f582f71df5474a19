//! Trace and report files, gzip-compressed when the name ends in `.gz`.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Open a trace for line-by-line reading.
pub fn open_trace(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open trace file: {}", path.display()))?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Create a streaming output file.
///
/// The gzip trailer is written when the writer is dropped.
pub fn create_output(path: &Path) -> Result<Box<dyn Write>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    if is_gzip(path) {
        Ok(Box::new(BufWriter::new(GzEncoder::new(
            file,
            Compression::default(),
        ))))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Write a complete output file in one go.
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    let context = || format!("Failed to write output file: {}", path.display());
    if !is_gzip(path) {
        return fs::write(path, contents).with_context(context);
    }
    let file = File::create(path).with_context(context)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(contents.as_bytes()).with_context(context)?;
    encoder.finish().with_context(context)?;
    Ok(())
}
