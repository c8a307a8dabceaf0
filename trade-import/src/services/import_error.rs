//! Import pipeline errors
//!
//! Severity is decided by the caller: file-level errors (`NotFound`, `Csv`,
//! `UnknownFileType`, `Write`, `BatchTimeout`) are logged and the run moves on
//! to the next file; `ClearYearData` and `NoCountries` end the job.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// Data file missing at read time
    #[error("CSV file not found: {0}")]
    NotFound(PathBuf),

    /// Malformed CSV content
    #[error("Error reading CSV file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// File name has no table descriptor
    #[error("Unknown CSV file type: {0}")]
    UnknownFileType(String),

    /// Batch insert failed; earlier batches stay committed
    #[error("Failed to insert batch {batch} into {table} ({committed} rows committed before failure): {source}")]
    Write {
        table: String,
        batch: usize,
        committed: u64,
        #[source]
        source: trade_common::Error,
    },

    /// Batch insert exceeded its deadline; earlier batches stay committed
    #[error("Batch {batch} into {table} exceeded the {timeout:?} deadline ({committed} rows committed before timeout)")]
    BatchTimeout {
        table: String,
        batch: usize,
        committed: u64,
        timeout: Duration,
    },

    /// Clear-year precondition failed
    #[error("Failed to clear data for year {year}: {source}")]
    ClearYearData {
        year: i16,
        #[source]
        source: trade_common::Error,
    },

    /// Country discovery found nothing to import
    #[error("No countries found for year {0}")]
    NoCountries(i16),

    /// Blocking parse task did not finish
    #[error("Background task error: {0}")]
    Task(String),
}

impl ImportError {
    /// Rows already committed when the error occurred
    pub fn rows_committed(&self) -> u64 {
        match self {
            ImportError::Write { committed, .. } | ImportError::BatchTimeout { committed, .. } => {
                *committed
            }
            _ => 0,
        }
    }
}
