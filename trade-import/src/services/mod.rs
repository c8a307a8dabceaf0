//! Import pipeline services
//!
//! Leaf to root: file discovery, CSV parsing, table mapping, batched
//! loading, job orchestration and the supervised runner.

pub mod bulk_loader;
pub mod file_locator;
pub mod import_error;
pub mod import_orchestrator;
pub mod job_runner;
pub mod job_store;
pub mod record_parser;
pub mod statistics_reader;
pub mod table_mapper;

pub use bulk_loader::{BulkLoader, LoadReport};
pub use file_locator::{FileLocator, ValidationReport};
pub use import_error::ImportError;
pub use import_orchestrator::{FileOutcome, ImportOrchestrator};
pub use job_runner::{JobRunner, SubmitError};
pub use job_store::JobStore;
pub use statistics_reader::StatisticsReader;
pub use table_mapper::{FileType, TableSpec};
