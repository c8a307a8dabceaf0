//! Event types for the trade import event system
//!
//! Import jobs emit progress events on an [`EventBus`]; the HTTP layer
//! forwards them to SSE clients. Events are notifications only: the job
//! status record remains the source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Trade import event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TradeEvent {
    /// Import job moved from Pending to Running
    ImportJobStarted {
        job_id: Uuid,
        year: i16,
        timestamp: DateTime<Utc>,
    },

    /// Import job advanced to a new step
    ImportProgressUpdate {
        job_id: Uuid,
        current_step: String,
        records_imported: u64,
        countries_processed: usize,
        timestamp: DateTime<Utc>,
    },

    /// A single file failed; the job continues
    ImportFileFailed {
        job_id: Uuid,
        source_file: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// Import job reached Completed
    ImportJobCompleted {
        job_id: Uuid,
        records_imported: u64,
        files_failed: usize,
        timestamp: DateTime<Utc>,
    },

    /// Import job reached Failed
    ImportJobFailed {
        job_id: Uuid,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl TradeEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            TradeEvent::ImportJobStarted { .. } => "ImportJobStarted",
            TradeEvent::ImportProgressUpdate { .. } => "ImportProgressUpdate",
            TradeEvent::ImportFileFailed { .. } => "ImportFileFailed",
            TradeEvent::ImportJobCompleted { .. } => "ImportJobCompleted",
            TradeEvent::ImportJobFailed { .. } => "ImportJobFailed",
        }
    }

    /// Job the event belongs to
    pub fn job_id(&self) -> Uuid {
        match self {
            TradeEvent::ImportJobStarted { job_id, .. }
            | TradeEvent::ImportProgressUpdate { job_id, .. }
            | TradeEvent::ImportFileFailed { job_id, .. }
            | TradeEvent::ImportJobCompleted { job_id, .. }
            | TradeEvent::ImportJobFailed { job_id, .. } => *job_id,
        }
    }
}

/// Broadcast bus for [`TradeEvent`]s
///
/// Cloning is cheap; all clones share one channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TradeEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow receivers lag
    ///
    /// # Examples
    ///
    /// ```
    /// use trade_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<TradeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: TradeEvent) -> Result<usize, broadcast::error::SendError<TradeEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: TradeEvent) {
        let _ = self.tx.send(event);
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
