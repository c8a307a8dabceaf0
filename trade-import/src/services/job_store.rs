//! In-memory job status store
//!
//! Owns every [`ImportProgress`] record. Updates run under the write lock so
//! a reader always sees a whole record. Terminal jobs are evicted once they
//! are older than the configured TTL.

use crate::models::ImportProgress;
use chrono::Duration as ChronoDuration;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Terminal jobs are kept this long unless configured otherwise
pub const DEFAULT_JOB_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, ImportProgress>>>,
    ttl: Duration,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new(DEFAULT_JOB_TTL)
    }
}

impl JobStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Register a job, evicting expired terminal jobs first
    pub async fn insert(&self, progress: ImportProgress) {
        let mut jobs = self.jobs.write().await;
        evict_locked(&mut jobs, self.ttl);
        jobs.insert(progress.job_id, progress);
    }

    /// Register a job unless another non-terminal job already covers its year
    ///
    /// Check and insert happen under one write lock. On conflict the id of
    /// the active job is returned.
    pub async fn try_insert(&self, progress: ImportProgress) -> Result<(), Uuid> {
        let mut jobs = self.jobs.write().await;
        if let Some(active) = jobs
            .values()
            .find(|p| p.year == progress.year && !p.is_terminal())
        {
            return Err(active.job_id);
        }
        evict_locked(&mut jobs, self.ttl);
        jobs.insert(progress.job_id, progress);
        Ok(())
    }

    /// Snapshot of one job
    pub async fn get(&self, job_id: Uuid) -> Option<ImportProgress> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    /// Mutate one job under the write lock; returns the updated snapshot
    pub async fn update<F>(&self, job_id: Uuid, mutate: F) -> Option<ImportProgress>
    where
        F: FnOnce(&mut ImportProgress),
    {
        let mut jobs = self.jobs.write().await;
        let progress = jobs.get_mut(&job_id)?;
        mutate(progress);
        Some(progress.clone())
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Drop terminal jobs completed more than `ttl` ago; returns how many
    pub async fn evict_expired(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        evict_locked(&mut jobs, self.ttl)
    }

    /// Background sweeper running [`JobStore::evict_expired`] every `interval`
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = store.evict_expired().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "Evicted expired import jobs");
                }
            }
        })
    }
}

fn evict_locked(jobs: &mut HashMap<Uuid, ImportProgress>, ttl: Duration) -> usize {
    let ttl = match ChronoDuration::from_std(ttl) {
        Ok(ttl) => ttl,
        Err(_) => return 0,
    };
    let cutoff = trade_common::time::now() - ttl;

    let before = jobs.len();
    jobs.retain(|_, p| match p.completed_at {
        Some(completed_at) if p.is_terminal() => completed_at > cutoff,
        _ => true,
    });
    before - jobs.len()
}
