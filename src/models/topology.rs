use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cluster::Cluster;
use super::node::NodeDetail;
use crate::error::{CoreError, Result};

/// The full desired/current-state record for one universe.
///
/// A topology document is a plain value: it is loaded as a snapshot, mutated
/// in memory by an updater, and replaced wholesale on a successful
/// compare-and-swap save. Every node's membership tags must reference a
/// cluster present in the same document, except transiently inside a
/// delete-cluster application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseTopology {
    pub universe_uuid: Uuid,
    pub name: String,
    pub clusters: Vec<Cluster>,
    pub node_details: Vec<NodeDetail>,
}

impl UniverseTopology {
    pub fn new(universe_uuid: Uuid, name: impl Into<String>) -> Self {
        Self {
            universe_uuid,
            name: name.into(),
            clusters: Vec::new(),
            node_details: Vec::new(),
        }
    }

    pub fn find_cluster(&self, cluster_uuid: Uuid) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.cluster_uuid == cluster_uuid)
    }

    pub fn has_cluster(&self, cluster_uuid: Uuid) -> bool {
        self.find_cluster(cluster_uuid).is_some()
    }

    /// Nodes currently placed in the given cluster
    pub fn nodes_in_cluster(&self, cluster_uuid: Uuid) -> Vec<&NodeDetail> {
        self.node_details
            .iter()
            .filter(|n| n.is_in_cluster(cluster_uuid))
            .collect()
    }

    /// Append a cluster entry. Membership validation is the updater's concern.
    pub fn add_cluster(&mut self, cluster: Cluster) {
        self.clusters.push(cluster);
    }

    /// Remove a cluster entry and every node placed in it.
    ///
    /// Both removals land in the same in-memory transformation so no
    /// intermediate state is ever observable through the store. Returns false
    /// when the cluster was already absent.
    pub fn delete_cluster(&mut self, cluster_uuid: Uuid) -> bool {
        let before = self.clusters.len();
        self.clusters.retain(|c| c.cluster_uuid != cluster_uuid);
        if self.clusters.len() == before {
            return false;
        }
        self.node_details.retain(|n| !n.is_in_cluster(cluster_uuid));
        true
    }

    /// Verify that no node references a cluster missing from this document
    /// and that node names are unique.
    pub fn validate(&self) -> Result<()> {
        for node in &self.node_details {
            for membership in &node.memberships {
                if !self.has_cluster(*membership) {
                    return Err(CoreError::ValidationError(format!(
                        "node {} references missing cluster {membership}",
                        node.node_name
                    )));
                }
            }
        }

        let mut seen = std::collections::HashSet::new();
        for node in &self.node_details {
            if !seen.insert(node.node_name.as_str()) {
                return Err(CoreError::ValidationError(format!(
                    "duplicate node name {}",
                    node.node_name
                )));
            }
        }

        Ok(())
    }
}
