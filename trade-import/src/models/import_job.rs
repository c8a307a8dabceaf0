//! Import job state machine
//!
//! A job moves `Pending → Running → {Completed | Failed}`. The progress
//! record is replaced as a whole under the job store's write lock, so a
//! status poll never observes a half-applied step.

use crate::services::file_locator::is_valid_country_code;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Earliest year accepted by the start-import API
pub const MIN_IMPORT_YEAR: i16 = 2019;

/// Latest year accepted by the start-import API
pub const MAX_IMPORT_YEAR: i16 = 2030;

/// Reject years outside the importable range before any job exists
pub fn validate_year(year: i16) -> trade_common::Result<()> {
    if (MIN_IMPORT_YEAR..=MAX_IMPORT_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(trade_common::Error::InvalidInput(format!(
            "Invalid year. Must be between {} and {}.",
            MIN_IMPORT_YEAR, MAX_IMPORT_YEAR
        )))
    }
}

/// Start-import request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub year: i16,

    /// Countries to import; `None` or empty imports every discovered country
    #[serde(default)]
    pub countries: Option<Vec<String>>,

    /// Delete the year's rows from every table before loading
    #[serde(default, alias = "clearExistingData")]
    pub clear_existing_data: bool,
}

impl ImportRequest {
    pub fn new(year: i16) -> Self {
        Self {
            year,
            countries: None,
            clear_existing_data: false,
        }
    }

    /// Caller-supplied countries, trimmed, blanks dropped
    pub fn requested_countries(&self) -> Vec<String> {
        self.countries
            .iter()
            .flatten()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Year range and country code shape, checked before a job is created
    pub fn validate(&self) -> trade_common::Result<()> {
        validate_year(self.year)?;
        match self
            .requested_countries()
            .into_iter()
            .find(|c| !is_valid_country_code(c))
        {
            Some(country) => Err(trade_common::Error::InvalidInput(format!(
                "Invalid country code: {}",
                country
            ))),
            None => Ok(()),
        }
    }
}

/// Import job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Job id minted and registered, task not yet running
    Pending,
    /// Background task is working through the country matrix
    Running,
    /// Every country × tradeflow × file combination was attempted
    Completed,
    /// Precondition failure, discovery failure or task failure
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One file that could not be imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// `<year>/<country>/<tradeflow>/<file name>`
    pub source_file: String,
    /// Target table, when the file name resolved
    pub table: Option<String>,
    /// Rows committed by earlier batches before the failure
    pub rows_committed: u64,
    pub error: String,
}

/// Progress record for one import job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub job_id: Uuid,
    pub year: i16,
    pub status: JobStatus,
    pub current_step: String,
    pub records_imported: u64,
    pub countries_processed: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub failures: Vec<FileFailure>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl ImportProgress {
    /// Freshly minted job in `Pending`
    pub fn new(job_id: Uuid, year: i16) -> Self {
        Self {
            job_id,
            year,
            status: JobStatus::Pending,
            current_step: String::from("Queued"),
            records_imported: 0,
            countries_processed: 0,
            files_processed: 0,
            files_failed: 0,
            failures: Vec::new(),
            started_at: trade_common::time::now(),
            completed_at: None,
            error_message: None,
        }
    }

    /// Move to `status`, stamping the completion time on terminal states
    pub fn transition_to(&mut self, status: JobStatus) {
        self.status = status;
        if status.is_terminal() && self.completed_at.is_none() {
            self.completed_at = Some(trade_common::time::now());
        }
    }

    pub fn set_step(&mut self, step: impl Into<String>) {
        self.current_step = step.into();
    }

    /// Mark `Completed` with the aggregate count in the step text
    pub fn complete(&mut self) {
        self.current_step = format!("Import completed. Total records: {}", self.records_imported);
        self.transition_to(JobStatus::Completed);
    }

    /// Mark `Failed`, keeping the error message verbatim
    pub fn fail(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.current_step = format!("Import failed: {}", error);
        self.error_message = Some(error);
        self.transition_to(JobStatus::Failed);
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Seconds since start (frozen once terminal)
    pub fn elapsed_seconds(&self) -> u64 {
        let end = self.completed_at.unwrap_or_else(trade_common::time::now);
        trade_common::time::elapsed_seconds(self.started_at, end)
    }
}
