//! HTTP API handlers for trade-import
//!
//! REST endpoints under `/api/tradeimport` plus an SSE progress stream.

pub mod health;
pub mod sse;
pub mod trade_import;

pub use health::health_routes;
pub use sse::import_event_stream;
pub use trade_import::trade_import_routes;
