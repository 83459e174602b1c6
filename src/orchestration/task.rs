//! Task contract and parameter types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Parameters scoping a task invocation to one universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseTaskParams {
    pub universe_uuid: Uuid,
}

impl UniverseTaskParams {
    pub fn new(universe_uuid: Uuid) -> Self {
        Self { universe_uuid }
    }
}

/// Parameters scoping a task invocation to one cluster within a universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTaskParams {
    pub universe_uuid: Uuid,
    pub cluster_uuid: Uuid,
}

impl ClusterTaskParams {
    pub fn new(universe_uuid: Uuid, cluster_uuid: Uuid) -> Self {
        Self {
            universe_uuid,
            cluster_uuid,
        }
    }
}

/// What a successful task run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Document version after the task, when it touched the store
    pub version: Option<u64>,
    /// Whether the committed document differs from the loaded one
    pub changed: bool,
}

impl TaskOutcome {
    pub fn committed(version: u64) -> Self {
        Self {
            version: Some(version),
            changed: true,
        }
    }

    pub fn converged(version: u64) -> Self {
        Self {
            version: Some(version),
            changed: false,
        }
    }
}

/// The uniform failure wrapper. Callers above a task never see the original
/// failure type, only the task's name and why it failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("task {task_name} failed: {cause}")]
pub struct TaskFailure {
    pub task_name: String,
    pub cause: String,
}

impl TaskFailure {
    pub fn new(task_name: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            cause: cause.into(),
        }
    }
}

/// One unit of orchestration work.
///
/// `name()` must deterministically encode the task kind plus the universe and
/// cluster identifiers it targets, so log lines across a multi-subtask
/// operation correlate without external ids. A task instance is executed at
/// most once.
#[async_trait]
pub trait UniverseTask: Send + Sync {
    fn name(&self) -> String;

    fn universe_uuid(&self) -> Uuid;

    async fn run(&self) -> Result<TaskOutcome, TaskFailure>;
}
