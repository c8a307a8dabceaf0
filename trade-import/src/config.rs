//! Runtime tuning for the import pipeline

use crate::services::bulk_loader::{DEFAULT_BATCH_SIZE, DEFAULT_BATCH_TIMEOUT};
use crate::services::job_runner::DEFAULT_MAX_CONCURRENT_JOBS;
use crate::services::job_store::DEFAULT_JOB_TTL;
use std::time::Duration;

/// Pipeline settings resolved from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    /// Rows per insert batch
    pub batch_size: usize,
    /// Deadline for a single batch write
    pub batch_timeout: Duration,
    /// Jobs allowed to run at once
    pub max_concurrent_jobs: usize,
    /// How long finished jobs stay queryable
    pub job_ttl: Duration,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            job_ttl: DEFAULT_JOB_TTL,
        }
    }
}

impl ImportSettings {
    /// Sweep interval for expired jobs: a tenth of the TTL, clamped to [1s, 5min]
    pub fn sweep_interval(&self) -> Duration {
        (self.job_ttl / 10).clamp(Duration::from_secs(1), Duration::from_secs(300))
    }
}
