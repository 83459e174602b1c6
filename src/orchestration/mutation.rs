//! # Topology Mutation Loop
//!
//! The bounded load/apply/save cycle shared by every task that mutates a
//! topology document. Version conflicts are retried immediately against the
//! freshly loaded document; store unavailability is retried with exponential
//! backoff; updater logic errors are never retried. Exhausting the attempt
//! ceiling surfaces as an error rather than looping.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::events::{EventPublisher, LifecycleEvent};
use crate::logging::log_mutation_operation;
use crate::store::{StoreError, UniverseStore};
use crate::updater::{UniverseUpdater, UpdaterError};

/// Retry policy for the load/apply/save cycle
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay_ms: 50,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl From<&OrchestratorConfig> for RetryPolicy {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            max_attempts: config.max_mutation_attempts,
            base_delay_ms: config.backoff_base_ms,
            max_delay_ms: config.backoff_max_ms,
            backoff_multiplier: config.backoff_multiplier,
        }
    }
}

/// Result of a committed (or converged) mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    pub universe_uuid: Uuid,
    /// Document version after the mutation
    pub version: u64,
    /// False when the updater found the document already converged and the
    /// save was skipped
    pub changed: bool,
    /// Load/apply/save attempts consumed
    pub attempts: u32,
}

/// Errors surfaced by the mutation loop
#[derive(Debug, Clone, thiserror::Error)]
pub enum MutationError {
    #[error("mutation of universe {universe_uuid} gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        universe_uuid: Uuid,
        attempts: u32,
        last_error: StoreError,
    },

    #[error(transparent)]
    Updater(#[from] UpdaterError),

    #[error(transparent)]
    Store(StoreError),
}

/// Applies an updater to a universe's topology document under optimistic
/// locking.
///
/// The critical section is short and in-memory bounded: load a snapshot,
/// transform it, attempt the compare-and-swap save. Losers of a concurrent
/// race reload and reapply; updaters are cheap pure transforms, so retrying
/// favors throughput over mutual exclusion.
pub struct TopologyMutation {
    store: Arc<dyn UniverseStore>,
    policy: RetryPolicy,
    event_publisher: EventPublisher,
}

impl TopologyMutation {
    pub fn new(store: Arc<dyn UniverseStore>) -> Self {
        Self {
            store,
            policy: RetryPolicy::default(),
            event_publisher: EventPublisher::default(),
        }
    }

    pub fn with_event_publisher(
        store: Arc<dyn UniverseStore>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            store,
            policy: RetryPolicy::default(),
            event_publisher,
        }
    }

    pub fn with_policy(
        store: Arc<dyn UniverseStore>,
        policy: RetryPolicy,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            store,
            policy,
            event_publisher,
        }
    }

    pub fn store(&self) -> &Arc<dyn UniverseStore> {
        &self.store
    }

    /// Run the bounded load/apply/save cycle for one updater.
    pub async fn apply(
        &self,
        universe_uuid: Uuid,
        updater: &dyn UniverseUpdater,
    ) -> Result<MutationResult, MutationError> {
        let mut delay_ms = self.policy.base_delay_ms;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let loaded = match self.store.load(universe_uuid).await {
                Ok(loaded) => loaded,
                Err(err) => {
                    self.handle_store_error(universe_uuid, attempt, &mut delay_ms, err)
                        .await?;
                    continue;
                }
            };

            let mut document = loaded.document;
            let outcome = updater.update(&mut document)?;

            if !outcome.is_changed() {
                debug!(
                    universe_uuid = %universe_uuid,
                    version = loaded.version,
                    "Updater converged without changes, skipping save"
                );
                return Ok(MutationResult {
                    universe_uuid,
                    version: loaded.version,
                    changed: false,
                    attempts: attempt,
                });
            }

            match self.store.save(universe_uuid, loaded.version, &document).await {
                Ok(new_version) => {
                    log_mutation_operation(
                        "save",
                        universe_uuid,
                        attempt,
                        Some(new_version),
                        "committed",
                        None,
                    );
                    let _ = self.event_publisher.publish(LifecycleEvent::MutationCommitted {
                        universe_uuid,
                        version: new_version,
                        committed_at: chrono::Utc::now(),
                    });
                    return Ok(MutationResult {
                        universe_uuid,
                        version: new_version,
                        changed: true,
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    self.handle_store_error(universe_uuid, attempt, &mut delay_ms, err)
                        .await?;
                }
            }
        }
    }

    /// Classify a store error: propagate fatal ones, back off on
    /// unavailability, and convert an exhausted attempt budget into
    /// [`MutationError::RetriesExhausted`].
    async fn handle_store_error(
        &self,
        universe_uuid: Uuid,
        attempt: u32,
        delay_ms: &mut u64,
        err: StoreError,
    ) -> Result<(), MutationError> {
        if !err.is_retryable() {
            return Err(MutationError::Store(err));
        }

        if attempt >= self.policy.max_attempts {
            warn!(
                universe_uuid = %universe_uuid,
                attempts = attempt,
                error = %err,
                "Mutation retry ceiling reached"
            );
            return Err(MutationError::RetriesExhausted {
                universe_uuid,
                attempts: attempt,
                last_error: err,
            });
        }

        log_mutation_operation(
            "retry",
            universe_uuid,
            attempt,
            None,
            "retrying",
            Some(&err.to_string()),
        );

        if err.wants_backoff() {
            tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
            let next = (*delay_ms as f64 * self.policy.backoff_multiplier) as u64;
            *delay_ms = next.min(self.policy.max_delay_ms);
        }

        Ok(())
    }
}
