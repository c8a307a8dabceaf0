//! trade-import library interface
//!
//! Bulk import of the year/country/tradeflow CSV tree into the trade
//! tables, with background job tracking and a small HTTP API.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};

use crate::config::ImportSettings;
use crate::db::TradeStore;
use crate::services::{
    BulkLoader, FileLocator, ImportOrchestrator, JobRunner, JobStore, StatisticsReader,
};
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use trade_common::events::EventBus;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// CSV tree under the configured data root
    pub locator: FileLocator,
    /// Import job status records
    pub jobs: JobStore,
    /// Background job submission
    pub runner: JobRunner,
    /// Per-year statistics
    pub statistics: StatisticsReader,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    pub settings: ImportSettings,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire the import pipeline over `store` and `locator`
    pub fn new(
        store: Arc<dyn TradeStore>,
        locator: FileLocator,
        event_bus: EventBus,
        settings: ImportSettings,
    ) -> Self {
        let jobs = JobStore::new(settings.job_ttl);
        let loader = BulkLoader::new(store.clone())
            .with_batch_size(settings.batch_size)
            .with_batch_timeout(settings.batch_timeout);
        let orchestrator = ImportOrchestrator::new(
            locator.clone(),
            store.clone(),
            loader,
            jobs.clone(),
            event_bus.clone(),
        );
        let runner = JobRunner::new(orchestrator, settings.max_concurrent_jobs);

        Self {
            statistics: StatisticsReader::new(store),
            locator,
            jobs,
            runner,
            event_bus,
            settings,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::trade_import_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
