use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Task and mutation lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// A task began executing
    TaskStarted {
        task_name: String,
        universe_uuid: Uuid,
        started_at: DateTime<Utc>,
    },
    /// A task finished successfully
    TaskSucceeded {
        task_name: String,
        universe_uuid: Uuid,
        duration_ms: u64,
        finished_at: DateTime<Utc>,
    },
    /// A task failed; the sequence above it will abort unless best-effort
    TaskFailed {
        task_name: String,
        universe_uuid: Uuid,
        error: String,
        failed_at: DateTime<Utc>,
    },
    /// A topology mutation committed at a new version
    MutationCommitted {
        universe_uuid: Uuid,
        version: u64,
        committed_at: DateTime<Utc>,
    },
    /// An executor finished a full subtask sequence
    OperationCompleted {
        operation: String,
        succeeded: bool,
        tasks_run: usize,
        completed_at: DateTime<Utc>,
    },
}

/// High-throughput publisher for lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. A send with zero subscribers is not an error; the
    /// core publishes whether or not anything is listening.
    pub fn publish(&self, event: LifecycleEvent) -> Result<(), PublishError> {
        match self.sender.send(event) {
            Ok(_) => Ok(()),
            Err(broadcast::error::SendError(_)) => Ok(()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Event channel is closed")]
    ChannelClosed,
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}
