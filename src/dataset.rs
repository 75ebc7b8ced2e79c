//! Dataset loading.
//!
//! Reads a JSON Lines file of problems, normalizes the informal statement and
//! proof of each record, and splits the result into the two display
//! partitions. The returned `Dataset` is built once at startup and never
//! mutated afterwards.

use crate::errors::DatasetError;
use crate::normalizer::{FieldText, json_type_name, normalize_field};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

/// Number of records, in file order, that form the primary partition.
pub const PRIMARY_PARTITION_SIZE: usize = 244;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: Option<String>,
    pub split: Option<String>,
    pub name: Option<String>,
    pub informal_stmt: String,
    pub informal_proof: String,
    /// 1-based position among all loaded records.
    pub index: usize,
    /// 1-based position within the record's partition.
    pub display_index: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub lines_read: usize,
    pub records: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    primary: Vec<Record>,
    secondary: Vec<Record>,
    stats: LoadStats,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>, stats: LoadStats) -> Self {
        let (primary, secondary) = partition(records, PRIMARY_PARTITION_SIZE);
        Self {
            primary,
            secondary,
            stats,
        }
    }

    pub fn primary(&self) -> &[Record] {
        &self.primary
    }

    pub fn secondary(&self) -> &[Record] {
        &self.secondary
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}

/// Load and partition the dataset at `path`.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    info!(path = %path.display(), "Loading dataset");
    let file = File::open(path)
        .with_context(|| format!("Failed to open dataset at {}", path.display()))?;
    let (records, stats) = read_records(BufReader::new(file))
        .with_context(|| format!("Failed to read dataset at {}", path.display()))?;
    let dataset = Dataset::from_records(records, stats);
    info!(
        lines = stats.lines_read,
        records = stats.records,
        skipped = stats.skipped,
        primary = dataset.primary().len(),
        secondary = dataset.secondary().len(),
        "Finished loading dataset"
    );
    Ok(dataset)
}

/// Read records from a JSON Lines source. Malformed lines are logged and
/// skipped; only read failures abort.
pub fn read_records<R: BufRead>(reader: R) -> Result<(Vec<Record>, LoadStats), DatasetError> {
    let mut records = Vec::new();
    let mut stats = LoadStats::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        stats.lines_read += 1;
        if line.trim().is_empty() {
            debug!(line = line_no, "Skipping blank line");
            stats.skipped += 1;
            continue;
        }
        match parse_object(&line, line_no) {
            Ok(object) => {
                records.push(build_record(&object, records.len() + 1, line_no));
            }
            Err(err) => {
                warn!(line = line_no, "Skipping record: {err}");
                stats.skipped += 1;
            }
        }
    }

    stats.records = records.len();
    Ok((records, stats))
}

pub(crate) fn parse_object(line: &str, line_no: usize) -> Result<Map<String, Value>, DatasetError> {
    let value: Value = serde_json::from_str(line).map_err(|source| DatasetError::Parse {
        line: line_no,
        source,
    })?;
    match value {
        Value::Object(object) => Ok(object),
        other => Err(DatasetError::NotAnObject {
            line: line_no,
            found: json_type_name(&other),
        }),
    }
}

fn build_record(object: &Map<String, Value>, index: usize, line_no: usize) -> Record {
    let informal_stmt = normalize_field(&field(object, "informal_stmt", line_no));
    let informal_proof = normalize_field(&field(object, "informal_proof", line_no));
    Record {
        id: field(object, "id", line_no).into_plain(),
        split: field(object, "split", line_no).into_plain(),
        name: field(object, "name", line_no).into_plain(),
        informal_stmt,
        informal_proof,
        index,
        display_index: index,
    }
}

fn field<'a>(object: &'a Map<String, Value>, key: &str, line_no: usize) -> FieldText<'a> {
    let text = FieldText::from_json(object.get(key));
    if let Some(issue) = text.issue() {
        debug!(line = line_no, field = key, "Recovered field: {issue}");
    }
    text
}

/// Split `records` after `boundary` and renumber each side from 1.
pub fn partition(mut records: Vec<Record>, boundary: usize) -> (Vec<Record>, Vec<Record>) {
    let secondary = if records.len() > boundary {
        records.split_off(boundary)
    } else {
        Vec::new()
    };
    (renumber(records), renumber(secondary))
}

fn renumber(records: Vec<Record>) -> Vec<Record> {
    records
        .into_iter()
        .enumerate()
        .map(|(idx, mut record)| {
            record.display_index = idx + 1;
            record
        })
        .collect()
}
