//! # Task Executor
//!
//! Runs an ordered list of tasks representing one logical operation.
//! Execution is sequential and fail-fast by default: a task failure aborts
//! the remaining sequence unless the entry is marked best-effort. The
//! executor never retries a failed task; transient version-conflict retry is
//! the mutation loop's concern, not the executor's.
//!
//! Cancellation is cooperative and checked only between tasks, never within
//! one: once a task begins its load/mutate/save attempt it runs to
//! completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::states::TaskState;
use super::task::UniverseTask;
use crate::events::{EventPublisher, LifecycleEvent};
use crate::logging::log_task_operation;

/// One entry in a subtask sequence.
pub struct TaskEntry {
    task: Arc<dyn UniverseTask>,
    best_effort: bool,
}

impl TaskEntry {
    /// A task whose failure aborts the remaining sequence
    pub fn new(task: Arc<dyn UniverseTask>) -> Self {
        Self {
            task,
            best_effort: false,
        }
    }

    /// A task whose failure is recorded but does not abort the sequence
    pub fn best_effort(task: Arc<dyn UniverseTask>) -> Self {
        Self {
            task,
            best_effort: true,
        }
    }
}

/// Outcome of one task within an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub task_name: String,
    pub state: TaskState,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Outcome of a full subtask sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub operation: String,
    pub succeeded: bool,
    pub reports: Vec<TaskReport>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ExecutionReport {
    /// Name of the first task that aborted the sequence, if any
    pub fn first_failure(&self) -> Option<&TaskReport> {
        self.reports.iter().find(|r| r.state == TaskState::Failed)
    }
}

/// Sequences tasks for one logical operation, enforcing ordering and
/// converting per-task failures into a uniform report.
pub struct TaskExecutor {
    event_publisher: EventPublisher,
    cancel: Option<Arc<AtomicBool>>,
}

impl TaskExecutor {
    pub fn new() -> Self {
        Self {
            event_publisher: EventPublisher::default(),
            cancel: None,
        }
    }

    pub fn with_event_publisher(event_publisher: EventPublisher) -> Self {
        Self {
            event_publisher,
            cancel: None,
        }
    }

    /// Attach a cooperative cancellation flag, polled between tasks only.
    pub fn with_cancellation(
        event_publisher: EventPublisher,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            event_publisher,
            cancel: Some(cancel),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Run the sequence. The report carries the overall status plus the
    /// ordered per-task outcomes; no partial success is ever reported.
    pub async fn execute(&self, operation: &str, entries: Vec<TaskEntry>) -> ExecutionReport {
        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(entries.len());
        let mut aborted = false;

        info!(
            operation = %operation,
            task_count = entries.len(),
            "Starting task sequence"
        );

        for entry in &entries {
            let task_name = entry.task.name();

            if aborted || self.is_cancelled() {
                if !aborted {
                    warn!(operation = %operation, task_name = %task_name, "Cancelled before task");
                    aborted = true;
                }
                reports.push(TaskReport {
                    task_name,
                    state: TaskState::Skipped,
                    duration_ms: 0,
                    error: None,
                });
                continue;
            }

            let universe_uuid = entry.task.universe_uuid();
            log_task_operation("run", &task_name, Some(universe_uuid), None, "started", None);
            let _ = self.event_publisher.publish(LifecycleEvent::TaskStarted {
                task_name: task_name.clone(),
                universe_uuid,
                started_at: Utc::now(),
            });

            let start = Instant::now();
            let result = entry.task.run().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(_) => {
                    log_task_operation(
                        "run",
                        &task_name,
                        Some(universe_uuid),
                        None,
                        "succeeded",
                        None,
                    );
                    let _ = self.event_publisher.publish(LifecycleEvent::TaskSucceeded {
                        task_name: task_name.clone(),
                        universe_uuid,
                        duration_ms,
                        finished_at: Utc::now(),
                    });
                    reports.push(TaskReport {
                        task_name,
                        state: TaskState::Succeeded,
                        duration_ms,
                        error: None,
                    });
                }
                Err(failure) => {
                    warn!(
                        operation = %operation,
                        task_name = %task_name,
                        error = %failure,
                        best_effort = entry.best_effort,
                        "Task failed"
                    );
                    let _ = self.event_publisher.publish(LifecycleEvent::TaskFailed {
                        task_name: task_name.clone(),
                        universe_uuid,
                        error: failure.to_string(),
                        failed_at: Utc::now(),
                    });
                    reports.push(TaskReport {
                        task_name,
                        state: TaskState::Failed,
                        duration_ms,
                        error: Some(failure.to_string()),
                    });
                    if !entry.best_effort {
                        aborted = true;
                    }
                }
            }
        }

        let succeeded = !aborted;
        let report = ExecutionReport {
            operation: operation.to_string(),
            succeeded,
            reports,
            started_at,
            completed_at: Utc::now(),
        };

        let _ = self.event_publisher.publish(LifecycleEvent::OperationCompleted {
            operation: operation.to_string(),
            succeeded,
            tasks_run: report
                .reports
                .iter()
                .filter(|r| r.state != TaskState::Skipped)
                .count(),
            completed_at: Utc::now(),
        });

        info!(
            operation = %operation,
            succeeded = succeeded,
            "Task sequence finished"
        );

        report
    }
}

impl Default for TaskExecutor {
    fn default() -> Self {
        Self::new()
    }
}
