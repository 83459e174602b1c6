//! # Updater Protocol
//!
//! A unit of mutation logic applied to a topology document. Updaters are pure
//! in-memory transforms: no I/O, no external side effects. The mutation loop
//! may reapply an updater against a freshly loaded document after a version
//! conflict, so every updater expresses its change declaratively ("remove
//! cluster X and its nodes") rather than as a relative delta.
//!
//! An updater that finds the document already in its target state reports
//! [`UpdateOutcome::Unchanged`]; the caller then skips the save and the
//! stored version does not move.

pub mod cluster;
pub mod nodes;

pub use cluster::{AddClusterUpdater, DeleteClusterUpdater};
pub use nodes::RemoveNodesUpdater;

use uuid::Uuid;

use crate::models::UniverseTopology;

/// Whether an updater application moved the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The document was transformed and must be saved
    Changed,
    /// The document was already in the target state; skip the save
    Unchanged,
}

impl UpdateOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Fatal updater logic errors. Never retried: reapplying the same updater to
/// the same state cannot succeed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpdaterError {
    #[error("cluster {0} not found in document")]
    ClusterNotFound(Uuid),

    #[error("cluster {0} already exists with different configuration")]
    DuplicateCluster(Uuid),

    #[error("invalid placement: {0}")]
    PlacementInvalid(String),
}

/// A unit of mutation logic applied exclusively and atomically against the
/// current topology document.
pub trait UniverseUpdater: Send + Sync {
    fn update(&self, topology: &mut UniverseTopology) -> Result<UpdateOutcome, UpdaterError>;
}

/// Closures are first-class updaters, so ad-hoc mutations can be expressed
/// inline and unit tested against synthetic documents.
impl<F> UniverseUpdater for F
where
    F: Fn(&mut UniverseTopology) -> Result<UpdateOutcome, UpdaterError> + Send + Sync,
{
    fn update(&self, topology: &mut UniverseTopology) -> Result<UpdateOutcome, UpdaterError> {
        self(topology)
    }
}
