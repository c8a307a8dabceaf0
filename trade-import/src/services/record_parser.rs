//! Tolerant CSV parsing into [`TradeImportRecord`]s
//!
//! Header names are matched case-insensitively, column order does not
//! matter, unknown columns are ignored and missing columns take defaults.
//! Records are fully materialized: callers need the count before loading.

use super::ImportError;
use crate::models::TradeImportRecord;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Parse a CSV file from disk
pub fn parse_file(path: &Path) -> Result<Vec<TradeImportRecord>, ImportError> {
    if !path.is_file() {
        return Err(ImportError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|e| ImportError::Csv {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    let records = parse_reader(file, path)?;

    tracing::info!(
        file = %path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
        count = records.len(),
        "Read CSV records"
    );
    Ok(records)
}

/// Parse CSV content; `origin` is used only for error messages
pub fn parse_reader<R: Read>(reader: R, origin: &Path) -> Result<Vec<TradeImportRecord>, ImportError> {
    let csv_error = |source: csv::Error| ImportError::Csv {
        path: origin.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // rows may be shorter or longer than the header
        .trim(Trim::All)
        .from_reader(reader);

    // Normalize header names so `Region1`, `REGION1` and ` region1 ` all match
    let headers: StringRecord = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    reader.set_headers(headers.clone());

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(csv_error)?;
        let record: TradeImportRecord = row.deserialize(Some(&headers)).map_err(csv_error)?;
        records.push(record);
    }

    Ok(records)
}
