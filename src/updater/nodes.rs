//! Node-level updaters.

use super::{UniverseUpdater, UpdateOutcome, UpdaterError};
use crate::models::UniverseTopology;

/// Remove named nodes from the document.
///
/// Declarative: names already absent are simply converged over, so the
/// updater can be reapplied after a version conflict without compounding.
#[derive(Debug, Clone)]
pub struct RemoveNodesUpdater {
    pub node_names: Vec<String>,
}

impl RemoveNodesUpdater {
    pub fn new(node_names: Vec<String>) -> Self {
        Self { node_names }
    }
}

impl UniverseUpdater for RemoveNodesUpdater {
    fn update(&self, topology: &mut UniverseTopology) -> Result<UpdateOutcome, UpdaterError> {
        let before = topology.node_details.len();
        topology
            .node_details
            .retain(|n| !self.node_names.contains(&n.node_name));

        if topology.node_details.len() == before {
            Ok(UpdateOutcome::Unchanged)
        } else {
            Ok(UpdateOutcome::Changed)
        }
    }
}
