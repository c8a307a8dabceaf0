//! Supervised execution of import jobs
//!
//! A job is registered as `Pending`, then handed to a bounded worker pool.
//! Every submission ends in a terminal status: pool exhaustion and task
//! panics are turned into `Failed` transitions by the supervisor.

use super::{ImportOrchestrator, JobStore};
use crate::models::{ImportProgress, ImportRequest};
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use trade_common::events::TradeEvent;
use uuid::Uuid;

/// Concurrent jobs unless configured otherwise
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 2;

/// Failure message for a submission that found no free worker
pub const POOL_EXHAUSTED_MESSAGE: &str = "worker pool exhausted";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("An import for year {year} is already in progress (job {job_id})")]
    AlreadyRunning { year: i16, job_id: Uuid },
}

/// Bounded pool running [`ImportOrchestrator::run`] in background tasks
#[derive(Clone)]
pub struct JobRunner {
    orchestrator: ImportOrchestrator,
    permits: Arc<Semaphore>,
    max_concurrent_jobs: usize,
}

impl JobRunner {
    pub fn new(orchestrator: ImportOrchestrator, max_concurrent_jobs: usize) -> Self {
        let max_concurrent_jobs = max_concurrent_jobs.max(1);
        Self {
            orchestrator,
            permits: Arc::new(Semaphore::new(max_concurrent_jobs)),
            max_concurrent_jobs,
        }
    }

    pub fn jobs(&self) -> &JobStore {
        self.orchestrator.jobs()
    }

    /// Jobs currently holding a worker
    pub fn running_jobs(&self) -> usize {
        self.max_concurrent_jobs - self.permits.available_permits()
    }

    /// Register a job and start it in the background
    ///
    /// Returns as soon as the job is registered. The returned id is valid
    /// for status polling even when the pool was exhausted (the job is then
    /// already `Failed`).
    pub async fn submit(&self, request: ImportRequest) -> Result<Uuid, SubmitError> {
        let job_id = Uuid::new_v4();
        let year = request.year;

        self.jobs()
            .try_insert(ImportProgress::new(job_id, year))
            .await
            .map_err(|active| SubmitError::AlreadyRunning {
                year,
                job_id: active,
            })?;

        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(
                    job_id = %job_id,
                    max_concurrent_jobs = self.max_concurrent_jobs,
                    "No free import worker"
                );
                self.fail_job(job_id, POOL_EXHAUSTED_MESSAGE.to_string()).await;
                return Ok(job_id);
            }
        };

        let orchestrator = self.orchestrator.clone();
        let worker = tokio::spawn(async move {
            // Held for the lifetime of the run
            let _permit = permit;
            tracing::info!(job_id = %job_id, "Background import task started");
            orchestrator.run(job_id, request).await
        });

        let supervisor = self.clone();
        tokio::spawn(async move {
            match worker.await {
                Ok(Ok(records)) => {
                    tracing::info!(job_id = %job_id, records, "Background import task finished");
                }
                Ok(Err(e)) => {
                    // Orchestrator already recorded the failure
                    tracing::debug!(job_id = %job_id, error = %e, "Background import task failed");
                }
                Err(join_error) => {
                    let message = if join_error.is_panic() {
                        format!(
                            "Import task panicked: {}",
                            panic_message(join_error.into_panic())
                        )
                    } else {
                        "Import task was cancelled".to_string()
                    };
                    tracing::error!(job_id = %job_id, error = %message, "Import task aborted");
                    supervisor.fail_job(job_id, message).await;
                }
            }
        });

        Ok(job_id)
    }

    /// Mark a job `Failed`; a job that already finished keeps its status
    /// and no event is emitted
    async fn fail_job(&self, job_id: Uuid, message: String) {
        let mut failed = false;
        self.jobs()
            .update(job_id, |p| {
                if !p.is_terminal() {
                    p.fail(message.clone());
                    failed = true;
                }
            })
            .await;

        if failed {
            self.orchestrator.event_bus().emit_lossy(TradeEvent::ImportJobFailed {
                job_id,
                error: message,
                timestamp: trade_common::time::now(),
            });
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
