//! Import run orchestration
//!
//! Walks the country × tradeflow × file matrix for one job, sequentially.
//! Each file yields a [`FileOutcome`]; outcomes are folded into the job's
//! [`ImportProgress`] record. A failing file is recorded and skipped. Only
//! the clear-year precondition and an empty country list fail the job.

use super::bulk_loader::BulkLoader;
use super::file_locator::{is_valid_country_code, FileLocator};
use super::{record_parser, table_mapper, ImportError, JobStore};
use crate::db::TradeStore;
use crate::models::{
    source_file_path, FileFailure, ImportProgress, ImportRequest, JobStatus, Trade, TradeflowType,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trade_common::events::{EventBus, TradeEvent};
use uuid::Uuid;

/// Result of importing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// `<year>/<country>/<tradeflow>/<file name>`
    pub source_file: String,
    /// Resolved target table; `None` when the name was not recognized
    pub table: Option<&'static str>,
    /// Rows committed, including batches committed before a failure
    pub rows_written: u64,
    pub error: Option<String>,
}

impl FileOutcome {
    fn failed(source_file: String, table: Option<&'static str>, err: &ImportError) -> Self {
        Self {
            source_file,
            table,
            rows_written: err.rows_committed(),
            error: Some(err.to_string()),
        }
    }

    /// Fold this outcome into the job's progress record
    pub fn apply_to(&self, progress: &mut ImportProgress) {
        progress.files_processed += 1;
        progress.records_imported += self.rows_written;
        if let Some(error) = &self.error {
            progress.files_failed += 1;
            progress.failures.push(FileFailure {
                source_file: self.source_file.clone(),
                table: self.table.map(str::to_string),
                rows_committed: self.rows_written,
                error: error.clone(),
            });
        }
    }
}

/// Runs one import job end to end
#[derive(Clone)]
pub struct ImportOrchestrator {
    locator: FileLocator,
    store: Arc<dyn TradeStore>,
    loader: BulkLoader,
    jobs: JobStore,
    event_bus: EventBus,
}

impl ImportOrchestrator {
    pub fn new(
        locator: FileLocator,
        store: Arc<dyn TradeStore>,
        loader: BulkLoader,
        jobs: JobStore,
        event_bus: EventBus,
    ) -> Self {
        Self {
            locator,
            store,
            loader,
            jobs,
            event_bus,
        }
    }

    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Execute the job and drive it to a terminal state
    ///
    /// Returns the aggregate records-imported count on completion. On failure
    /// the job is already marked `Failed` with the error text verbatim.
    pub async fn run(&self, job_id: Uuid, request: ImportRequest) -> Result<u64, ImportError> {
        let year = request.year;

        self.jobs
            .update(job_id, |p| {
                p.transition_to(JobStatus::Running);
                p.set_step(format!("Starting import for year {}", year));
            })
            .await;
        self.event_bus.emit_lossy(TradeEvent::ImportJobStarted {
            job_id,
            year,
            timestamp: trade_common::time::now(),
        });

        tracing::info!(
            job_id = %job_id,
            year,
            clear_existing_data = request.clear_existing_data,
            "Starting trade data import"
        );

        match self.execute(job_id, &request).await {
            Ok(total) => {
                let progress = self.jobs.update(job_id, |p| p.complete()).await;
                let files_failed = progress.map(|p| p.files_failed).unwrap_or_default();

                tracing::info!(
                    job_id = %job_id,
                    records_imported = total,
                    files_failed,
                    "Import completed"
                );
                self.event_bus.emit_lossy(TradeEvent::ImportJobCompleted {
                    job_id,
                    records_imported: total,
                    files_failed,
                    timestamp: trade_common::time::now(),
                });
                Ok(total)
            }
            Err(err) => {
                let message = err.to_string();
                self.jobs.update(job_id, |p| p.fail(message.clone())).await;

                tracing::error!(job_id = %job_id, error = %message, "Import failed");
                self.event_bus.emit_lossy(TradeEvent::ImportJobFailed {
                    job_id,
                    error: message,
                    timestamp: trade_common::time::now(),
                });
                Err(err)
            }
        }
    }

    async fn execute(&self, job_id: Uuid, request: &ImportRequest) -> Result<u64, ImportError> {
        let year = request.year;

        if request.clear_existing_data {
            self.set_step(job_id, format!("Clearing existing data for year {}", year))
                .await;

            let cleared = self
                .store
                .clear_year_data(year)
                .await
                .map_err(|source| ImportError::ClearYearData { year, source })?;

            for result in &cleared {
                tracing::info!(
                    job_id = %job_id,
                    table = %result.table_name,
                    rows_deleted = result.rows_deleted,
                    "Cleared table"
                );
            }
        }

        let countries = self.resolve_countries(request);
        if countries.is_empty() {
            return Err(ImportError::NoCountries(year));
        }

        let mut total = 0u64;
        for country in &countries {
            for tradeflow in TradeflowType::ALL {
                self.set_step(job_id, format!("Processing {} - {}", country, tradeflow))
                    .await;

                for file in self.locator.locate_files(year, country, tradeflow) {
                    let outcome = self.import_file(year, country, tradeflow, file).await;
                    total += outcome.rows_written;
                    self.record_outcome(job_id, &outcome).await;
                }
            }

            let snapshot = self
                .jobs
                .update(job_id, |p| p.countries_processed += 1)
                .await;
            if let Some(p) = snapshot {
                self.emit_progress(&p);
            }
            tracing::info!(job_id = %job_id, country = %country, "Country processed");
        }

        Ok(total)
    }

    /// Caller-supplied countries, or every country folder for the year
    ///
    /// Malformed requested codes are dropped; they never reach the file tree.
    fn resolve_countries(&self, request: &ImportRequest) -> Vec<String> {
        let requested = request.requested_countries();
        if requested.is_empty() {
            return self.locator.available_countries(request.year);
        }
        requested
            .into_iter()
            .filter(|country| {
                let valid = is_valid_country_code(country);
                if !valid {
                    tracing::warn!(year = request.year, country = %country, "Skipping malformed country code");
                }
                valid
            })
            .collect()
    }

    /// Resolve, parse, enrich and load one file; never fails the job
    pub async fn import_file(
        &self,
        year: i16,
        country: &str,
        tradeflow: TradeflowType,
        path: PathBuf,
    ) -> FileOutcome {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source_file = source_file_path(year, country, tradeflow, &file_name);

        let spec = match table_mapper::resolve(&file_name) {
            Ok(spec) => spec,
            Err(err) => {
                tracing::error!(file = %source_file, error = %err, "Error processing file");
                return FileOutcome::failed(source_file, None, &err);
            }
        };

        tracing::info!(file = %source_file, table = spec.table, "Processing file");

        let records = match parse_in_background(path).await {
            Ok(records) => records,
            Err(err) => {
                tracing::error!(file = %source_file, error = %err, "Error processing file");
                return FileOutcome::failed(source_file, Some(spec.table), &err);
            }
        };

        if records.is_empty() {
            tracing::info!(file = %source_file, "No records in file, skipping");
            return FileOutcome {
                source_file,
                table: Some(spec.table),
                rows_written: 0,
                error: None,
            };
        }

        let trades: Vec<Trade> = records
            .into_iter()
            .map(|record| Trade::from_record(record, year, tradeflow, &source_file))
            .collect();

        let report = self.loader.load(spec, &trades).await;
        match report.error {
            None => {
                tracing::info!(
                    file = %source_file,
                    table = spec.table,
                    rows = report.rows_written,
                    "Imported file"
                );
                FileOutcome {
                    source_file,
                    table: Some(spec.table),
                    rows_written: report.rows_written,
                    error: None,
                }
            }
            Some(err) => {
                tracing::error!(file = %source_file, error = %err, "Error processing file");
                FileOutcome::failed(source_file, Some(spec.table), &err)
            }
        }
    }

    async fn record_outcome(&self, job_id: Uuid, outcome: &FileOutcome) {
        let snapshot = self.jobs.update(job_id, |p| outcome.apply_to(p)).await;

        if let Some(error) = &outcome.error {
            self.event_bus.emit_lossy(TradeEvent::ImportFileFailed {
                job_id,
                source_file: outcome.source_file.clone(),
                error: error.clone(),
                timestamp: trade_common::time::now(),
            });
        }
        if let Some(p) = snapshot {
            self.emit_progress(&p);
        }
    }

    async fn set_step(&self, job_id: Uuid, step: String) {
        tracing::debug!(job_id = %job_id, step = %step, "Import step");
        if let Some(p) = self.jobs.update(job_id, |p| p.set_step(step)).await {
            self.emit_progress(&p);
        }
    }

    fn emit_progress(&self, progress: &ImportProgress) {
        self.event_bus.emit_lossy(TradeEvent::ImportProgressUpdate {
            job_id: progress.job_id,
            current_step: progress.current_step.clone(),
            records_imported: progress.records_imported,
            countries_processed: progress.countries_processed,
            timestamp: trade_common::time::now(),
        });
    }
}

/// Parse on the blocking pool; file reads are synchronous
async fn parse_in_background(
    path: PathBuf,
) -> Result<Vec<crate::models::TradeImportRecord>, ImportError> {
    tokio::task::spawn_blocking(move || record_parser::parse_file(Path::new(&path)))
        .await
        .map_err(|e| ImportError::Task(e.to_string()))?
}
