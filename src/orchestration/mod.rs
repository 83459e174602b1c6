//! # Orchestration Engine
//!
//! Decomposes a high-level universe operation into an ordered sequence of
//! idempotent subtasks and executes them with bounded retry and
//! partial-failure recovery.
//!
//! ## Core Components
//!
//! - **TopologyMutation**: the bounded load/apply/save loop every mutating
//!   task shares; retries version conflicts against fresh state and backs
//!   off on store unavailability
//! - **UniverseTask**: one unit of orchestration work with a deterministic
//!   name for cross-subtask log correlation
//! - **TaskExecutor**: sequential, fail-fast subtask sequencing with
//!   per-task reports and cooperative cancellation between tasks
//! - **TaskRegistry**: tagged dispatch from operation kind + typed
//!   parameters to concrete tasks
//!
//! Business-logic failures are never retried above the mutation loop; they
//! surface as a uniform `TaskFailure` and abort the remaining sequence.

pub mod cluster_tasks;
pub mod executor;
pub mod mutation;
pub mod registry;
pub mod states;
pub mod task;

pub use cluster_tasks::{AddClusterToUniverse, DeleteClusterFromUniverse, RemoveNodesFromUniverse};
pub use executor::{ExecutionReport, TaskEntry, TaskExecutor, TaskReport};
pub use mutation::{MutationError, MutationResult, RetryPolicy, TopologyMutation};
pub use registry::{
    CustomTaskBuilder, OperationKind, OperationRequest, RegistryError, TaskRegistry,
};
pub use states::TaskState;
pub use task::{ClusterTaskParams, TaskFailure, TaskOutcome, UniverseTask, UniverseTaskParams};
