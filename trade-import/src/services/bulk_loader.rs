//! Batched writes of [`Trade`] rows into one target table
//!
//! Rows are written in fixed-size batches, one transaction per batch. A
//! failed or timed-out batch stops the file; rows from earlier batches stay
//! committed and are reported alongside the error.

use super::table_mapper::TableSpec;
use super::ImportError;
use crate::db::TradeStore;
use crate::models::Trade;
use std::sync::Arc;
use std::time::Duration;

/// Rows per batch unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Per-batch write deadline unless configured otherwise
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of loading one file's rows
#[derive(Debug)]
pub struct LoadReport {
    /// Rows committed by successful batches
    pub rows_written: u64,
    /// Batches attempted (including a failed one)
    pub batches: usize,
    /// Set when a batch failed; later batches were not attempted
    pub error: Option<ImportError>,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Collapse into the row count or the error
    pub fn into_result(self) -> Result<u64, ImportError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.rows_written),
        }
    }
}

/// Writes rows to the store in bounded batches
#[derive(Clone)]
pub struct BulkLoader {
    store: Arc<dyn TradeStore>,
    batch_size: usize,
    batch_timeout: Duration,
}

impl BulkLoader {
    pub fn new(store: Arc<dyn TradeStore>) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }

    /// Override batch size (values below 1 are treated as 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_timeout(mut self, batch_timeout: Duration) -> Self {
        self.batch_timeout = batch_timeout;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Write `rows` into `spec.table` in batches of `batch_size`
    pub async fn load(&self, spec: &'static TableSpec, rows: &[Trade]) -> LoadReport {
        let mut report = LoadReport {
            rows_written: 0,
            batches: 0,
            error: None,
        };

        for (index, chunk) in rows.chunks(self.batch_size).enumerate() {
            let batch = index + 1;
            report.batches = batch;

            let write = self.store.insert_batch(spec, chunk);
            match tokio::time::timeout(self.batch_timeout, write).await {
                Ok(Ok(inserted)) => {
                    report.rows_written += inserted;
                    tracing::debug!(
                        table = spec.table,
                        batch,
                        rows = inserted,
                        total = report.rows_written,
                        "Batch committed"
                    );
                }
                Ok(Err(source)) => {
                    tracing::error!(
                        table = spec.table,
                        batch,
                        committed = report.rows_written,
                        error = %source,
                        "Batch insert failed"
                    );
                    report.error = Some(ImportError::Write {
                        table: spec.table.to_string(),
                        batch,
                        committed: report.rows_written,
                        source,
                    });
                    break;
                }
                Err(_) => {
                    tracing::error!(
                        table = spec.table,
                        batch,
                        committed = report.rows_written,
                        timeout_ms = self.batch_timeout.as_millis() as u64,
                        "Batch insert timed out"
                    );
                    report.error = Some(ImportError::BatchTimeout {
                        table: spec.table.to_string(),
                        batch,
                        committed: report.rows_written,
                        timeout: self.batch_timeout,
                    });
                    break;
                }
            }
        }

        if report.is_success() {
            tracing::info!(
                table = spec.table,
                rows = report.rows_written,
                batches = report.batches,
                "Bulk load complete"
            );
        }

        report
    }
}
