//! Data models for trade-import
//!
//! - Parsed CSV rows and enriched trade rows
//! - Import job state machine and progress record
//! - Statistics read-path DTOs

pub mod import_job;
pub mod statistics;
pub mod trade;

pub use import_job::{
    validate_year, FileFailure, ImportProgress, ImportRequest, JobStatus, MAX_IMPORT_YEAR,
    MIN_IMPORT_YEAR,
};
pub use statistics::{ClearYearResult, CountryInfo, ImportStatistics, TableCount, YearStatistics};
pub use trade::{source_file_path, Trade, TradeImportRecord, TradeflowType};
