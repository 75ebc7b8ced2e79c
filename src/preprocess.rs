//! Derivation of the intermediate dataset file.
//!
//! Keeps only the fields the viewer reads and stamps each record with its
//! 1-based line position in the raw input. Text is copied verbatim; the
//! normalizer runs later, at load time.

use crate::dataset::parse_object;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// Output shape; field order here is the key order on disk.
#[derive(Debug, Serialize)]
struct ProcessedItem {
    id: Value,
    split: Value,
    informal_stmt: Value,
    informal_proof: Value,
    name: Value,
    index: usize,
}

impl ProcessedItem {
    fn from_object(object: &mut Map<String, Value>, index: usize) -> Self {
        let mut take = |key: &str| object.remove(key).unwrap_or(Value::Null);
        Self {
            id: take("id"),
            split: take("split"),
            informal_stmt: take("informal_stmt"),
            informal_proof: take("informal_proof"),
            name: take("name"),
            index,
        }
    }
}

/// Convert the raw file at `input` into the viewer's input format at
/// `output`. Returns the number of records written.
pub fn process_file(input: &Path, output: &Path) -> Result<usize> {
    info!(input = %input.display(), output = %output.display(), "Processing raw dataset");
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?,
    );
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("Failed to create {}", output.display()))?,
    );

    let written = process_lines(reader, &mut writer)
        .with_context(|| format!("Failed to process {}", input.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        items = written,
        output = %output.display(),
        "Processed items and saved output"
    );
    Ok(written)
}

fn process_lines<R: BufRead, W: Write>(reader: R, writer: &mut W) -> Result<usize> {
    let mut written = 0usize;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let mut object = match parse_object(line.trim(), line_no) {
            Ok(object) => object,
            Err(err) => {
                warn!(line = line_no, problematic = %line.trim(), "Skipping line: {err}");
                continue;
            }
        };
        let item = ProcessedItem::from_object(&mut object, line_no);
        serde_json::to_writer(&mut *writer, &item)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    Ok(written)
}
