#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Universe Core
//!
//! Rust core for lifecycle orchestration of distributed database clusters
//! ("universes") composed of nodes grouped into regions, availability zones,
//! and placement clusters.
//!
//! ## Overview
//!
//! A high-level control action such as "delete a cluster from a universe" is
//! decomposed into an ordered sequence of idempotent subtasks. Each subtask
//! mutates the universe's authoritative topology document through an
//! optimistic compare-and-swap protocol: load a versioned snapshot, apply a
//! pure in-memory updater, and save iff the stored version is unchanged.
//! Losers of a concurrent race reload and reapply; retry ceilings are finite
//! and exhaustion surfaces as a task failure, never silent data loss.
//!
//! ## Module Organization
//!
//! - [`models`] - Topology documents, clusters, node details, reference data
//! - [`store`] - Versioned persistence with compare-and-swap-by-version
//! - [`updater`] - Pure declarative document transformations
//! - [`orchestration`] - Tasks, the mutation retry loop, executor, registry
//! - [`events`] - Lifecycle event publishing
//! - [`config`] - Environment-driven runtime configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured tracing initialization and helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use universe_core::orchestration::{
//!     ClusterTaskParams, DeleteClusterFromUniverse, TaskEntry, TaskExecutor, TopologyMutation,
//! };
//! use universe_core::store::{InMemoryUniverseStore, UniverseStore};
//! use uuid::Uuid;
//!
//! # async fn example() {
//! let store: Arc<dyn UniverseStore> = Arc::new(InMemoryUniverseStore::new());
//! let mutation = Arc::new(TopologyMutation::new(store));
//!
//! let task = DeleteClusterFromUniverse::new(
//!     ClusterTaskParams::new(Uuid::new_v4(), Uuid::new_v4()),
//!     mutation,
//! );
//!
//! let executor = TaskExecutor::new();
//! let report = executor
//!     .execute("delete_cluster", vec![TaskEntry::new(Arc::new(task))])
//!     .await;
//! println!("operation succeeded: {}", report.succeeded);
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Serialization is per-universe and optimistic. Unrelated universes never
//! contend; concurrent mutations of the same universe race on the version
//! counter and the loser retries against the fresh document. Updaters are
//! cheap pure transforms, so the load/apply/save critical section stays
//! short and in-memory bounded.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod store;
pub mod updater;

pub use config::OrchestratorConfig;
pub use error::{CoreError, Result};
pub use events::{EventPublisher, LifecycleEvent};
pub use models::{
    AvailabilityZone, Cluster, ClusterRole, NodeDetail, NodeState, PlacementSpec, Provider,
    ReferenceData, Region, UniverseTopology,
};
pub use orchestration::{
    ExecutionReport, MutationError, MutationResult, OperationKind, OperationRequest, RetryPolicy,
    TaskEntry, TaskExecutor, TaskFailure, TaskOutcome, TaskRegistry, TaskReport, TaskState,
    TopologyMutation, UniverseTask,
};
pub use store::{StoreError, UniverseStore, Versioned};
pub use updater::{UniverseUpdater, UpdateOutcome, UpdaterError};
